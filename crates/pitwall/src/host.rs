/// Outbound surface of the game/network runtime. Every call is
/// fire-and-forget: the core never consumes a return value and never blocks
/// on delivery. Implementations are expected to be non-blocking.
pub trait HostApi {
    fn send_global_chat_message(&self, prefix: &str, message: &str);
    fn send_player_chat_message(&self, steam_id: u64, prefix: &str, message: &str);
    fn show_screen_message(&self, message: &str, seconds: f32);

    fn set_player_time_on_leaderboard(&self, steam_id: u64, time_seconds: f32, notify: bool);
    fn set_player_leaderboard_overrides(
        &self,
        steam_id: u64,
        time: &str,
        name: &str,
        position: &str,
        points: &str,
        points_won: &str,
    );
    fn remove_player_from_leaderboard(&self, steam_id: u64, notify: bool);
    fn set_small_leaderboard_sorting_method(&self, sort_on_points: bool);

    fn set_player_championship_points(&self, steam_id: u64, points: i32, change: i32, notify: bool);
    fn reset_championship_points(&self, notify: bool);
    fn set_points_distribution(&self, values: &[i32], baseline: i32, dnf: i32);
    fn reset_points_distribution(&self);

    fn block_player_from_setting_time(&self, steam_id: u64, notify: bool);
    fn unblock_player_from_setting_time(&self, steam_id: u64, notify: bool);
    fn block_everyone_from_setting_time(&self, notify: bool);
    fn unblock_everyone_from_setting_time(&self, notify: bool);

    fn set_round_length(&self, seconds: i32);
    fn set_voteskip(&self, enabled: bool);
    fn set_voteskip_percentage(&self, percentage: i32);
    fn set_lobby_name(&self, name: &str);
    fn set_server_message(&self, message: &str, seconds: f32);
    fn remove_server_message(&self);
}

/// Host that swallows every call. Used when no runtime is attached, e.g.
/// while validating a config.
pub struct NullHost;

impl HostApi for NullHost {
    fn send_global_chat_message(&self, _prefix: &str, _message: &str) {}
    fn send_player_chat_message(&self, _steam_id: u64, _prefix: &str, _message: &str) {}
    fn show_screen_message(&self, _message: &str, _seconds: f32) {}

    fn set_player_time_on_leaderboard(&self, _steam_id: u64, _time_seconds: f32, _notify: bool) {}
    fn set_player_leaderboard_overrides(
        &self,
        _steam_id: u64,
        _time: &str,
        _name: &str,
        _position: &str,
        _points: &str,
        _points_won: &str,
    ) {
    }
    fn remove_player_from_leaderboard(&self, _steam_id: u64, _notify: bool) {}
    fn set_small_leaderboard_sorting_method(&self, _sort_on_points: bool) {}

    fn set_player_championship_points(
        &self,
        _steam_id: u64,
        _points: i32,
        _change: i32,
        _notify: bool,
    ) {
    }
    fn reset_championship_points(&self, _notify: bool) {}
    fn set_points_distribution(&self, _values: &[i32], _baseline: i32, _dnf: i32) {}
    fn reset_points_distribution(&self) {}

    fn block_player_from_setting_time(&self, _steam_id: u64, _notify: bool) {}
    fn unblock_player_from_setting_time(&self, _steam_id: u64, _notify: bool) {}
    fn block_everyone_from_setting_time(&self, _notify: bool) {}
    fn unblock_everyone_from_setting_time(&self, _notify: bool) {}

    fn set_round_length(&self, _seconds: i32) {}
    fn set_voteskip(&self, _enabled: bool) {}
    fn set_voteskip_percentage(&self, _percentage: i32) {}
    fn set_lobby_name(&self, _name: &str) {}
    fn set_server_message(&self, _message: &str, _seconds: f32) {}
    fn remove_server_message(&self) {}
}
