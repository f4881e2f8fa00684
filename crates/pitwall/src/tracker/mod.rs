use std::collections::HashMap;

use tracing::debug;

mod types;

pub use types::{
    BestResult, Level, LevelOverview, LevelSnapshot, OverviewRow, Player, PlayerSnapshot,
    TrackerNotification, UNSET_TIME_SECONDS,
};

/// Authoritative in-memory knowledge of players, levels and best results for
/// the current room session. Players are never deleted, only flagged offline;
/// levels are immutable after first sighting; results hold at most one entry
/// per (player, level) pair.
#[derive(Debug, Default)]
pub struct RoomTracker {
    players: HashMap<u64, Player>,
    levels: HashMap<String, Level>,
    results: HashMap<String, Vec<BestResult>>,
    current_level_uid: Option<String>,
}

impl RoomTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconciles the tracker against an external room-state snapshot. Safe
    /// to call on lobby entry, level (re)load and every leaderboard update;
    /// reprocessing identical state changes nothing and raises nothing.
    ///
    /// Returns the finish/improvement notifications produced by this call,
    /// in snapshot order.
    pub fn process_room_state(
        &mut self,
        players: &[PlayerSnapshot],
        level: Option<&LevelSnapshot>,
    ) -> Vec<TrackerNotification> {
        let Some(level) = level else {
            return Vec::new();
        };

        if !self.levels.contains_key(&level.uid) {
            self.levels.insert(level.uid.clone(), level.to_level());
            self.results.insert(level.uid.clone(), Vec::new());
        }
        self.current_level_uid = Some(level.uid.clone());

        let mut notifications = Vec::new();
        for snapshot in players {
            self.register_snapshot_player(snapshot);

            let Some(time_seconds) = finish_time(snapshot) else {
                continue;
            };

            let level_results = self
                .results
                .entry(level.uid.clone())
                .or_default();
            let result = BestResult {
                steam_id: snapshot.steam_id,
                level_uid: level.uid.clone(),
                time_seconds,
            };
            match level_results
                .iter()
                .position(|existing| existing.steam_id == snapshot.steam_id)
            {
                Some(index) => {
                    // A stored best is never revoked by a worse or equal time.
                    if time_seconds < level_results[index].time_seconds {
                        level_results.remove(index);
                        level_results.push(result.clone());
                        notifications.push(TrackerNotification::PlayerImproved(result));
                    }
                }
                None => {
                    level_results.push(result.clone());
                    notifications.push(TrackerNotification::PlayerFinished(result));
                }
            }
        }
        notifications
    }

    /// Registers a player on lobby join; no-op for an already-known id.
    pub fn add_player(&mut self, snapshot: &PlayerSnapshot) {
        if !self.players.contains_key(&snapshot.steam_id) {
            self.players.insert(
                snapshot.steam_id,
                Player {
                    steam_id: snapshot.steam_id,
                    name: snapshot.name.clone(),
                    is_online: true,
                    points: 0,
                    points_delta: 0,
                },
            );
        }
    }

    pub fn set_player_offline(&mut self, steam_id: u64) {
        if let Some(player) = self.players.get_mut(&steam_id) {
            player.is_online = false;
        }
    }

    pub fn set_all_offline(&mut self) {
        for player in self.players.values_mut() {
            player.is_online = false;
        }
    }

    /// Overwrites a known player's championship points and last delta; no-op
    /// for unknown ids.
    pub fn set_player_points(&mut self, steam_id: u64, points: i32, points_delta: i32) {
        if let Some(player) = self.players.get_mut(&steam_id) {
            player.points = points;
            player.points_delta = points_delta;
        }
    }

    pub fn reset_all_points(&mut self) {
        for player in self.players.values_mut() {
            player.points = 0;
            player.points_delta = 0;
        }
    }

    /// Administrative removal of a player's recorded time on a level.
    /// Returns whether a result was actually removed.
    pub fn remove_result(&mut self, level_uid: &str, steam_id: u64) -> bool {
        let Some(level_results) = self.results.get_mut(level_uid) else {
            debug!("remove_result: no results recorded for level '{level_uid}'");
            return false;
        };
        match level_results
            .iter()
            .position(|result| result.steam_id == steam_id)
        {
            Some(index) => {
                level_results.remove(index);
                true
            }
            None => {
                debug!("remove_result: no result for player {steam_id} on level '{level_uid}'");
                false
            }
        }
    }

    pub fn clear_results(&mut self) {
        for level_results in self.results.values_mut() {
            level_results.clear();
        }
    }

    pub fn clear_all(&mut self) {
        self.players.clear();
        self.levels.clear();
        self.results.clear();
        self.current_level_uid = None;
    }

    pub fn get_player(&self, steam_id: u64) -> Option<&Player> {
        self.players.get(&steam_id)
    }

    pub fn get_level(&self, uid: &str) -> Option<&Level> {
        self.levels.get(uid)
    }

    pub fn get_current_level(&self) -> Option<&Level> {
        self.current_level_uid
            .as_deref()
            .and_then(|uid| self.levels.get(uid))
    }

    pub fn results_for_level(&self, uid: &str) -> &[BestResult] {
        self.results
            .get(uid)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Per-level listing of recorded times, sorted ascending, with player
    /// names resolved. Levels are ordered by uid so repeated calls render
    /// identically.
    pub fn results_overview(&self) -> Vec<LevelOverview> {
        let mut level_uids: Vec<&String> = self.results.keys().collect();
        level_uids.sort();

        let mut overview = Vec::with_capacity(level_uids.len());
        for uid in level_uids {
            let Some(level) = self.levels.get(uid) else {
                continue;
            };
            let mut rows: Vec<OverviewRow> = self.results[uid]
                .iter()
                .map(|result| OverviewRow {
                    steam_id: result.steam_id,
                    player_name: self
                        .players
                        .get(&result.steam_id)
                        .map(|player| player.name.clone())
                        .unwrap_or_default(),
                    time_seconds: result.time_seconds,
                })
                .collect();
            rows.sort_by(|a, b| a.time_seconds.total_cmp(&b.time_seconds));
            overview.push(LevelOverview {
                uid: level.uid.clone(),
                name: level.name.clone(),
                workshop_id: level.workshop_id,
                author: level.author.clone(),
                times: rows,
            });
        }
        overview
    }

    fn register_snapshot_player(&mut self, snapshot: &PlayerSnapshot) {
        match self.players.get_mut(&snapshot.steam_id) {
            Some(player) => player.is_online = true,
            None => {
                self.players.insert(
                    snapshot.steam_id,
                    Player {
                        steam_id: snapshot.steam_id,
                        name: snapshot.name.clone(),
                        is_online: true,
                        points: 0,
                        points_delta: 0,
                    },
                );
            }
        }
    }
}

fn finish_time(snapshot: &PlayerSnapshot) -> Option<f32> {
    match snapshot.leaderboard_time_seconds {
        Some(time) if time != UNSET_TIME_SECONDS => Some(time),
        _ => None,
    }
}
