use tracing::{info, warn};

use super::args::{parse_bool_arg, parse_float_arg, parse_int_arg, parse_int_array_arg};
use super::context::Context;
use crate::host::HostApi;
use crate::tracker::{Player, RoomTracker};

const MIN_ROUND_LENGTH_SECONDS: i32 = 30;

/// The closed set of operator-invocable actions. Resolution from a config
/// command name happens once at load time; an unknown name is a per-binding
/// load error, never a runtime crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SendGlobalChatMessage,
    SendPlayerChatMessage,
    ShowScreenMessage,
    SetPlayerChampionshipPoints,
    AddPlayerChampionshipPoints,
    ResetChampionshipPoints,
    SetPointsDistribution,
    ResetPointsDistribution,
    SetPlayerTimeOnLeaderboard,
    SetPlayerLeaderboardOverrides,
    RemovePlayerFromLeaderboard,
    SetSmallLeaderboardSortingMethod,
    BlockPlayerFromSettingTime,
    UnblockPlayerFromSettingTime,
    BlockEveryoneFromSettingTime,
    UnblockEveryoneFromSettingTime,
    SetRoundLength,
    SetVoteskip,
    SetVoteskipPercentage,
    SetLobbyName,
    SetServerMessage,
    RemoveServerMessage,
    PrintResultsToConsole,
    ClearAllTrackingData,
    ClearTrackingResults,
}

impl Action {
    pub fn from_name(name: &str) -> Option<Self> {
        let action = match name {
            "SendGlobalChatMessage" => Self::SendGlobalChatMessage,
            "SendPlayerChatMessage" => Self::SendPlayerChatMessage,
            "ShowScreenMessage" => Self::ShowScreenMessage,
            "SetPlayerChampionshipPoints" => Self::SetPlayerChampionshipPoints,
            "AddPlayerChampionshipPoints" => Self::AddPlayerChampionshipPoints,
            "ResetChampionshipPoints" => Self::ResetChampionshipPoints,
            "SetPointsDistribution" => Self::SetPointsDistribution,
            "ResetPointsDistribution" => Self::ResetPointsDistribution,
            "SetPlayerTimeOnLeaderboard" => Self::SetPlayerTimeOnLeaderboard,
            "SetPlayerLeaderboardOverrides" => Self::SetPlayerLeaderboardOverrides,
            "RemovePlayerFromLeaderboard" => Self::RemovePlayerFromLeaderboard,
            "SetSmallLeaderboardSortingMethod" => Self::SetSmallLeaderboardSortingMethod,
            "BlockPlayerFromSettingTime" => Self::BlockPlayerFromSettingTime,
            "UnblockPlayerFromSettingTime" => Self::UnblockPlayerFromSettingTime,
            "BlockEveryoneFromSettingTime" => Self::BlockEveryoneFromSettingTime,
            "UnblockEveryoneFromSettingTime" => Self::UnblockEveryoneFromSettingTime,
            "SetRoundLength" => Self::SetRoundLength,
            "SetVoteskip" => Self::SetVoteskip,
            "SetVoteskipPercentage" => Self::SetVoteskipPercentage,
            "SetLobbyName" => Self::SetLobbyName,
            "SetServerMessage" => Self::SetServerMessage,
            "RemoveServerMessage" => Self::RemoveServerMessage,
            "PrintResultsToConsole" => Self::PrintResultsToConsole,
            "ClearAllTrackingData" => Self::ClearAllTrackingData,
            "ClearTrackingResults" => Self::ClearTrackingResults,
            _ => return None,
        };
        Some(action)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SendGlobalChatMessage => "SendGlobalChatMessage",
            Self::SendPlayerChatMessage => "SendPlayerChatMessage",
            Self::ShowScreenMessage => "ShowScreenMessage",
            Self::SetPlayerChampionshipPoints => "SetPlayerChampionshipPoints",
            Self::AddPlayerChampionshipPoints => "AddPlayerChampionshipPoints",
            Self::ResetChampionshipPoints => "ResetChampionshipPoints",
            Self::SetPointsDistribution => "SetPointsDistribution",
            Self::ResetPointsDistribution => "ResetPointsDistribution",
            Self::SetPlayerTimeOnLeaderboard => "SetPlayerTimeOnLeaderboard",
            Self::SetPlayerLeaderboardOverrides => "SetPlayerLeaderboardOverrides",
            Self::RemovePlayerFromLeaderboard => "RemovePlayerFromLeaderboard",
            Self::SetSmallLeaderboardSortingMethod => "SetSmallLeaderboardSortingMethod",
            Self::BlockPlayerFromSettingTime => "BlockPlayerFromSettingTime",
            Self::UnblockPlayerFromSettingTime => "UnblockPlayerFromSettingTime",
            Self::BlockEveryoneFromSettingTime => "BlockEveryoneFromSettingTime",
            Self::UnblockEveryoneFromSettingTime => "UnblockEveryoneFromSettingTime",
            Self::SetRoundLength => "SetRoundLength",
            Self::SetVoteskip => "SetVoteskip",
            Self::SetVoteskipPercentage => "SetVoteskipPercentage",
            Self::SetLobbyName => "SetLobbyName",
            Self::SetServerMessage => "SetServerMessage",
            Self::RemoveServerMessage => "RemoveServerMessage",
            Self::PrintResultsToConsole => "PrintResultsToConsole",
            Self::ClearAllTrackingData => "ClearAllTrackingData",
            Self::ClearTrackingResults => "ClearTrackingResults",
        }
    }

    /// Validates and converts the raw arguments, then performs the action's
    /// effect against the tracker and/or the host. Fail-closed: on arity
    /// mismatch, a failed conversion or a missing required subject, one
    /// diagnostic is logged and no side effect happens.
    pub fn invoke(
        self,
        args: &[String],
        context: &Context,
        tracker: &mut RoomTracker,
        host: &dyn HostApi,
    ) {
        match self {
            Self::SendGlobalChatMessage => {
                if !self.check_arity(args, 2) {
                    return;
                }
                let prefix = context.apply_tokens(&args[0]);
                let message = context.apply_tokens(&args[1]);
                host.send_global_chat_message(&prefix, &message);
            }
            Self::SendPlayerChatMessage => {
                if !self.check_arity(args, 2) {
                    return;
                }
                let Some(player) = self.require_subject(context) else {
                    return;
                };
                let prefix = context.apply_tokens(&args[0]);
                let message = context.apply_tokens(&args[1]);
                host.send_player_chat_message(player.steam_id, &prefix, &message);
            }
            Self::ShowScreenMessage => {
                if !self.check_arity(args, 2) {
                    return;
                }
                let Some(seconds) = self.float_arg(args, 1, "duration") else {
                    return;
                };
                let message = context.apply_tokens(&args[0]);
                if message.is_empty() {
                    return;
                }
                host.show_screen_message(&message, seconds);
            }
            Self::SetPlayerChampionshipPoints => {
                if !self.check_arity(args, 3) {
                    return;
                }
                let Some(player) = self.require_subject(context) else {
                    return;
                };
                let (points, change, notify) = match (
                    self.int_arg(args, 0, "points"),
                    self.int_arg(args, 1, "change"),
                    self.bool_arg(args, 2, "notify"),
                ) {
                    (Some(points), Some(change), Some(notify)) => (points, change, notify),
                    _ => return,
                };
                let steam_id = player.steam_id;
                tracker.set_player_points(steam_id, points, change);
                host.set_player_championship_points(steam_id, points, change, notify);
            }
            Self::AddPlayerChampionshipPoints => {
                if !self.check_arity(args, 2) {
                    return;
                }
                let Some(player) = self.require_subject(context) else {
                    return;
                };
                let (delta, notify) = match (
                    self.int_arg(args, 0, "points"),
                    self.bool_arg(args, 1, "notify"),
                ) {
                    (Some(delta), Some(notify)) => (delta, notify),
                    _ => return,
                };
                // The total builds on the context's snapshot of the player,
                // not a fresh tracker lookup.
                let total = player.points + delta;
                let steam_id = player.steam_id;
                tracker.set_player_points(steam_id, total, delta);
                host.set_player_championship_points(steam_id, total, delta, notify);
            }
            Self::ResetChampionshipPoints => {
                if !self.check_arity(args, 1) {
                    return;
                }
                let Some(notify) = self.bool_arg(args, 0, "notify") else {
                    return;
                };
                tracker.reset_all_points();
                host.reset_championship_points(notify);
            }
            Self::SetPointsDistribution => {
                if !self.check_arity(args, 3) {
                    return;
                }
                let (values, baseline, dnf) = match (
                    self.int_array_arg(args, 0, "values"),
                    self.int_arg(args, 1, "baseline"),
                    self.int_arg(args, 2, "dnf"),
                ) {
                    (Some(values), Some(baseline), Some(dnf)) => (values, baseline, dnf),
                    _ => return,
                };
                host.set_points_distribution(&values, baseline, dnf);
            }
            Self::ResetPointsDistribution => {
                host.reset_points_distribution();
            }
            Self::SetPlayerTimeOnLeaderboard => {
                if !self.check_arity(args, 2) {
                    return;
                }
                let Some(player) = self.require_subject(context) else {
                    return;
                };
                let (time_seconds, notify) = match (
                    self.float_arg(args, 0, "time"),
                    self.bool_arg(args, 1, "notify"),
                ) {
                    (Some(time_seconds), Some(notify)) => (time_seconds, notify),
                    _ => return,
                };
                host.set_player_time_on_leaderboard(player.steam_id, time_seconds, notify);
            }
            Self::SetPlayerLeaderboardOverrides => {
                if !self.check_arity(args, 5) {
                    return;
                }
                let Some(player) = self.require_subject(context) else {
                    return;
                };
                host.set_player_leaderboard_overrides(
                    player.steam_id,
                    &context.apply_tokens(&args[0]),
                    &context.apply_tokens(&args[1]),
                    &context.apply_tokens(&args[2]),
                    &context.apply_tokens(&args[3]),
                    &context.apply_tokens(&args[4]),
                );
            }
            Self::RemovePlayerFromLeaderboard => {
                if !self.check_arity(args, 1) {
                    return;
                }
                let Some(player) = self.require_subject(context) else {
                    return;
                };
                let Some(notify) = self.bool_arg(args, 0, "notify") else {
                    return;
                };
                let steam_id = player.steam_id;
                if let Some(level) = context.level.as_ref() {
                    tracker.remove_result(&level.uid, steam_id);
                }
                host.remove_player_from_leaderboard(steam_id, notify);
            }
            Self::SetSmallLeaderboardSortingMethod => {
                if !self.check_arity(args, 1) {
                    return;
                }
                let Some(sort_on_points) = self.bool_arg(args, 0, "sortOnPoints") else {
                    return;
                };
                host.set_small_leaderboard_sorting_method(sort_on_points);
            }
            Self::BlockPlayerFromSettingTime | Self::UnblockPlayerFromSettingTime => {
                if !self.check_arity(args, 1) {
                    return;
                }
                let Some(player) = self.require_subject(context) else {
                    return;
                };
                let Some(notify) = self.bool_arg(args, 0, "notify") else {
                    return;
                };
                if self == Self::BlockPlayerFromSettingTime {
                    host.block_player_from_setting_time(player.steam_id, notify);
                } else {
                    host.unblock_player_from_setting_time(player.steam_id, notify);
                }
            }
            Self::BlockEveryoneFromSettingTime | Self::UnblockEveryoneFromSettingTime => {
                if !self.check_arity(args, 1) {
                    return;
                }
                let Some(notify) = self.bool_arg(args, 0, "notify") else {
                    return;
                };
                if self == Self::BlockEveryoneFromSettingTime {
                    host.block_everyone_from_setting_time(notify);
                } else {
                    host.unblock_everyone_from_setting_time(notify);
                }
            }
            Self::SetRoundLength => {
                if !self.check_arity(args, 1) {
                    return;
                }
                let Some(seconds) = self.int_arg(args, 0, "seconds") else {
                    return;
                };
                host.set_round_length(seconds.max(MIN_ROUND_LENGTH_SECONDS));
            }
            Self::SetVoteskip => {
                if !self.check_arity(args, 1) {
                    return;
                }
                let Some(enabled) = self.bool_arg(args, 0, "enabled") else {
                    return;
                };
                host.set_voteskip(enabled);
            }
            Self::SetVoteskipPercentage => {
                if !self.check_arity(args, 1) {
                    return;
                }
                let Some(percentage) = self.int_arg(args, 0, "percentage") else {
                    return;
                };
                host.set_voteskip_percentage(percentage.clamp(1, 100));
            }
            Self::SetLobbyName => {
                if !self.check_arity(args, 1) {
                    return;
                }
                host.set_lobby_name(&context.apply_tokens(&args[0]));
            }
            Self::SetServerMessage => {
                if !self.check_arity(args, 2) {
                    return;
                }
                let Some(seconds) = self.float_arg(args, 1, "duration") else {
                    return;
                };
                let message = context.apply_tokens(&args[0]);
                if message.trim().is_empty() {
                    return;
                }
                host.set_server_message(&message, seconds);
            }
            Self::RemoveServerMessage => {
                host.remove_server_message();
            }
            Self::PrintResultsToConsole => {
                for level in tracker.results_overview() {
                    info!("Level: {}", level.name);
                    for row in &level.times {
                        info!("{}: {}", row.player_name, row.time_seconds);
                    }
                }
            }
            Self::ClearAllTrackingData => {
                tracker.clear_all();
            }
            Self::ClearTrackingResults => {
                tracker.clear_results();
            }
        }
    }

    fn check_arity(self, args: &[String], expected: usize) -> bool {
        if args.len() == expected {
            return true;
        }
        warn!(
            "{}: incorrect amount of arguments, expected {expected}, found {}",
            self.name(),
            args.len()
        );
        false
    }

    fn require_subject(self, context: &Context) -> Option<&Player> {
        if context.player.is_none() {
            warn!("{}: no subject player in context", self.name());
        }
        context.player.as_ref()
    }

    fn bool_arg(self, args: &[String], index: usize, what: &str) -> Option<bool> {
        let value = parse_bool_arg(&args[index]);
        if value.is_none() {
            warn!(
                "{}: error parsing {what}, expected true | false, found '{}'",
                self.name(),
                args[index]
            );
        }
        value
    }

    fn int_arg(self, args: &[String], index: usize, what: &str) -> Option<i32> {
        let value = parse_int_arg(&args[index]);
        if value.is_none() {
            warn!(
                "{}: error parsing {what}, expected an integer, found '{}'",
                self.name(),
                args[index]
            );
        }
        value
    }

    fn float_arg(self, args: &[String], index: usize, what: &str) -> Option<f32> {
        let value = parse_float_arg(&args[index]);
        if value.is_none() {
            warn!(
                "{}: error parsing {what}, expected a number, found '{}'",
                self.name(),
                args[index]
            );
        }
        value
    }

    fn int_array_arg(self, args: &[String], index: usize, what: &str) -> Option<Vec<i32>> {
        let value = parse_int_array_arg(&args[index]);
        if value.is_none() {
            warn!(
                "{}: error parsing {what}, expected an int array like [1,2,3], found '{}'",
                self.name(),
                args[index]
            );
        }
        value
    }
}
