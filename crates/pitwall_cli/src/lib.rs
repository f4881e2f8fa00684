use std::cell::RefCell;
use std::fs;
use std::io;
use std::rc::Rc;

use serde::Deserialize;
use tracing::debug;

use pitwall::{
    HostApi, LevelSnapshot, NullHost, PlayerSnapshot, RoomAutomation, RoomConfig,
};

pub enum CommandKind {
    Check { config_path: String },
    Replay { config_path: String, feed_path: String },
}

pub fn run(kind: CommandKind, out: &mut dyn io::Write) -> Result<(), String> {
    match kind {
        CommandKind::Check { config_path } => run_check(&config_path, out),
        CommandKind::Replay {
            config_path,
            feed_path,
        } => run_replay(&config_path, &feed_path, out),
    }
}

/// Loads a config with no host attached and reports every rejected binding.
/// Fails (nonzero exit) when any binding is invalid, so the check can gate a
/// config rollout.
fn run_check(config_path: &str, out: &mut dyn io::Write) -> Result<(), String> {
    let config = load_config_document(config_path)?;
    let mut engine = RoomAutomation::new(Box::new(NullHost));
    let report = engine.load_config(config);

    writeln!(out, "bindings registered: {}", report.bindings_registered)
        .map_err(|error| format!("write output: {error}"))?;
    for issue in &report.issues {
        writeln!(out, "invalid binding: {issue}")
            .map_err(|error| format!("write output: {error}"))?;
    }
    if report.is_clean() {
        writeln!(out, "config ok").map_err(|error| format!("write output: {error}"))?;
        Ok(())
    } else {
        Err(format!(
            "config has {} invalid binding(s)",
            report.issues.len()
        ))
    }
}

/// Feeds a recorded session through a fresh engine and prints every outbound
/// host call in arrival order, so an operator can see exactly what a config
/// would do before putting it in front of players.
fn run_replay(config_path: &str, feed_path: &str, out: &mut dyn io::Write) -> Result<(), String> {
    let config = load_config_document(config_path)?;
    let raw_feed = fs::read_to_string(feed_path)
        .map_err(|error| format!("read feed '{feed_path}': {error}"))?;
    let feed = parse_feed_json(&raw_feed)?;

    let (host, calls) = EchoHost::new();
    let mut engine = RoomAutomation::new(Box::new(host));
    let report = engine.load_config(config);
    for issue in &report.issues {
        writeln!(out, "invalid binding: {issue}")
            .map_err(|error| format!("write output: {error}"))?;
    }

    for event in feed {
        apply_feed_event(&mut engine, event);
    }
    engine.unload_config();

    for line in calls.borrow().iter() {
        writeln!(out, "{line}").map_err(|error| format!("write output: {error}"))?;
    }
    Ok(())
}

fn load_config_document(path: &str) -> Result<RoomConfig, String> {
    let raw =
        fs::read_to_string(path).map_err(|error| format!("read config '{path}': {error}"))?;
    debug!("read config document from '{path}' ({} bytes)", raw.len());
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    match serde_path_to_error::deserialize::<_, RoomConfig>(&mut deserializer) {
        Ok(config) => Ok(config),
        Err(error) => {
            let json_path = error.path().to_string();
            let source = error.into_inner();
            if json_path.is_empty() || json_path == "." {
                Err(format!("parse config json: {source}"))
            } else {
                Err(format!("parse config json at {json_path}: {source}"))
            }
        }
    }
}

fn parse_feed_json(raw: &str) -> Result<Vec<FeedEvent>, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, Vec<FeedEvent>>(&mut deserializer) {
        Ok(feed) => Ok(feed),
        Err(error) => {
            let json_path = error.path().to_string();
            let source = error.into_inner();
            if json_path.is_empty() || json_path == "." {
                Err(format!("parse feed json: {source}"))
            } else {
                Err(format!("parse feed json at {json_path}: {source}"))
            }
        }
    }
}

fn apply_feed_event(engine: &mut RoomAutomation, event: FeedEvent) {
    match event {
        FeedEvent::RoomState { level, players } => {
            let level = level.as_ref().map(FeedLevel::to_snapshot);
            let players: Vec<PlayerSnapshot> =
                players.iter().map(FeedPlayer::to_snapshot).collect();
            engine.process_room_state(&players, level.as_ref());
        }
        FeedEvent::PlayerJoined { player } => engine.player_joined(&player.to_snapshot()),
        FeedEvent::PlayerLeft { steam_id } => engine.player_left(steam_id),
        FeedEvent::RoundStarted => engine.round_started(),
        FeedEvent::RoundEnded => engine.round_ended(),
        FeedEvent::RoomLeft => engine.room_left(),
    }
}

/// One entry of a recorded session feed, mirroring the inbound host signals.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum FeedEvent {
    RoomState {
        level: Option<FeedLevel>,
        #[serde(default)]
        players: Vec<FeedPlayer>,
    },
    PlayerJoined {
        player: FeedPlayer,
    },
    PlayerLeft {
        steam_id: u64,
    },
    RoundStarted,
    RoundEnded,
    RoomLeft,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeedPlayer {
    steam_id: u64,
    name: String,
    #[serde(default)]
    time_seconds: Option<f32>,
}

impl FeedPlayer {
    fn to_snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            steam_id: self.steam_id,
            name: self.name.clone(),
            leaderboard_time_seconds: self.time_seconds,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FeedLevel {
    uid: String,
    name: String,
    #[serde(default)]
    workshop_id: u64,
    #[serde(default)]
    author: String,
}

impl FeedLevel {
    fn to_snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            uid: self.uid.clone(),
            name: self.name.clone(),
            workshop_id: self.workshop_id,
            author: self.author.clone(),
        }
    }
}

/// Host that renders every outbound call to one line, in arrival order,
/// through a handle shared with the caller.
struct EchoHost {
    lines: Rc<RefCell<Vec<String>>>,
}

impl EchoHost {
    fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
        let lines = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                lines: Rc::clone(&lines),
            },
            lines,
        )
    }

    fn echo(&self, line: String) {
        self.lines.borrow_mut().push(line);
    }
}

impl HostApi for EchoHost {
    fn send_global_chat_message(&self, prefix: &str, message: &str) {
        self.echo(format!("SendGlobalChatMessage(prefix={prefix}, message={message})"));
    }

    fn send_player_chat_message(&self, steam_id: u64, prefix: &str, message: &str) {
        self.echo(format!(
            "SendPlayerChatMessage(steam_id={steam_id}, prefix={prefix}, message={message})"
        ));
    }

    fn show_screen_message(&self, message: &str, seconds: f32) {
        self.echo(format!("ShowScreenMessage(message={message}, seconds={seconds})"));
    }

    fn set_player_time_on_leaderboard(&self, steam_id: u64, time_seconds: f32, notify: bool) {
        self.echo(format!(
            "SetPlayerTimeOnLeaderboard(steam_id={steam_id}, time={time_seconds}, notify={notify})"
        ));
    }

    fn set_player_leaderboard_overrides(
        &self,
        steam_id: u64,
        time: &str,
        name: &str,
        position: &str,
        points: &str,
        points_won: &str,
    ) {
        self.echo(format!(
            "SetPlayerLeaderboardOverrides(steam_id={steam_id}, time={time}, name={name}, \
             position={position}, points={points}, points_won={points_won})"
        ));
    }

    fn remove_player_from_leaderboard(&self, steam_id: u64, notify: bool) {
        self.echo(format!(
            "RemovePlayerFromLeaderboard(steam_id={steam_id}, notify={notify})"
        ));
    }

    fn set_small_leaderboard_sorting_method(&self, sort_on_points: bool) {
        self.echo(format!(
            "SetSmallLeaderboardSortingMethod(sort_on_points={sort_on_points})"
        ));
    }

    fn set_player_championship_points(&self, steam_id: u64, points: i32, change: i32, notify: bool) {
        self.echo(format!(
            "SetPlayerChampionshipPoints(steam_id={steam_id}, points={points}, change={change}, \
             notify={notify})"
        ));
    }

    fn reset_championship_points(&self, notify: bool) {
        self.echo(format!("ResetChampionshipPoints(notify={notify})"));
    }

    fn set_points_distribution(&self, values: &[i32], baseline: i32, dnf: i32) {
        self.echo(format!(
            "SetPointsDistribution(values={values:?}, baseline={baseline}, dnf={dnf})"
        ));
    }

    fn reset_points_distribution(&self) {
        self.echo("ResetPointsDistribution()".to_string());
    }

    fn block_player_from_setting_time(&self, steam_id: u64, notify: bool) {
        self.echo(format!(
            "BlockPlayerFromSettingTime(steam_id={steam_id}, notify={notify})"
        ));
    }

    fn unblock_player_from_setting_time(&self, steam_id: u64, notify: bool) {
        self.echo(format!(
            "UnblockPlayerFromSettingTime(steam_id={steam_id}, notify={notify})"
        ));
    }

    fn block_everyone_from_setting_time(&self, notify: bool) {
        self.echo(format!("BlockEveryoneFromSettingTime(notify={notify})"));
    }

    fn unblock_everyone_from_setting_time(&self, notify: bool) {
        self.echo(format!("UnblockEveryoneFromSettingTime(notify={notify})"));
    }

    fn set_round_length(&self, seconds: i32) {
        self.echo(format!("SetRoundLength(seconds={seconds})"));
    }

    fn set_voteskip(&self, enabled: bool) {
        self.echo(format!("SetVoteskip(enabled={enabled})"));
    }

    fn set_voteskip_percentage(&self, percentage: i32) {
        self.echo(format!("SetVoteskipPercentage(percentage={percentage})"));
    }

    fn set_lobby_name(&self, name: &str) {
        self.echo(format!("SetLobbyName(name={name})"));
    }

    fn set_server_message(&self, message: &str, seconds: f32) {
        self.echo(format!("SetServerMessage(message={message}, seconds={seconds})"));
    }

    fn remove_server_message(&self) {
        self.echo("RemoveServerMessage()".to_string());
    }
}
