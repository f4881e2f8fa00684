use serde::Serialize;

/// Leaderboard sentinel for "no time recorded". A snapshot carrying exactly
/// this value is treated as if the player had no entry at all.
pub const UNSET_TIME_SECONDS: f32 = -1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub steam_id: u64,
    pub name: String,
    pub is_online: bool,
    pub points: i32,
    pub points_delta: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub uid: String,
    pub name: String,
    pub workshop_id: u64,
    pub author: String,
}

/// A player's recorded best time on a level within the tracker lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct BestResult {
    pub steam_id: u64,
    pub level_uid: String,
    pub time_seconds: f32,
}

/// One player row of an inbound room-state snapshot, as delivered by the
/// host layer on lobby entry, level load, and every leaderboard update.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub steam_id: u64,
    pub name: String,
    pub leaderboard_time_seconds: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelSnapshot {
    pub uid: String,
    pub name: String,
    pub workshop_id: u64,
    pub author: String,
}

impl LevelSnapshot {
    pub(crate) fn to_level(&self) -> Level {
        Level {
            uid: self.uid.clone(),
            name: self.name.clone(),
            workshop_id: self.workshop_id,
            author: self.author.clone(),
        }
    }
}

/// Raised by `RoomTracker::process_room_state` and dispatched by the binding
/// engine as `OnPlayerFinished` / `OnPlayerImproved`.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerNotification {
    PlayerFinished(BestResult),
    PlayerImproved(BestResult),
}

/// Flattened per-level result listing for operator diagnostics. Serialized
/// as-is by the results export and rendered line-by-line by
/// `PrintResultsToConsole`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LevelOverview {
    pub uid: String,
    pub name: String,
    pub workshop_id: u64,
    pub author: String,
    pub times: Vec<OverviewRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OverviewRow {
    pub steam_id: u64,
    pub player_name: String,
    pub time_seconds: f32,
}
