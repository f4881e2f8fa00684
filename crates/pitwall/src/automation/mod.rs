use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::{debug, info};

mod actions;
mod args;
mod command;
mod config;
mod context;

pub use actions::Action;
pub use command::{parse_command, CommandCall};
pub use config::{ConfigError, LifecycleEvent, RoomConfig};
pub use context::Context;

use crate::host::HostApi;
use crate::tracker::{BestResult, LevelSnapshot, PlayerSnapshot, RoomTracker, TrackerNotification};

/// One registered (event, action, arguments) triple from a config command.
#[derive(Debug, Clone)]
struct Binding {
    action: Action,
    args: Vec<String>,
}

/// Outcome of a config load: how many bindings registered and which commands
/// were rejected. Rejections never abort the rest of the load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub bindings_registered: usize,
    pub issues: Vec<BindingIssue>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingIssue {
    #[error("{event}: unknown action '{name}' in command '{command}'")]
    UnknownAction {
        event: LifecycleEvent,
        name: String,
        command: String,
    },
    #[error("{event}: command '{command}' has no action name")]
    EmptyCommand {
        event: LifecycleEvent,
        command: String,
    },
}

/// The automation engine: owns the room tracker, the active config and the
/// event bindings, and drives bound actions against the host. One instance
/// per room session; nothing here is process-global, so tests (and hosts)
/// can run several isolated engines.
///
/// Lifecycle events are delivered synchronously and handled to completion;
/// the engine is single-threaded by contract with the host.
pub struct RoomAutomation {
    tracker: RoomTracker,
    host: Box<dyn HostApi>,
    bindings: HashMap<LifecycleEvent, Vec<Binding>>,
    parameters: BTreeMap<String, String>,
    config: Option<RoomConfig>,
}

impl RoomAutomation {
    pub fn new(host: Box<dyn HostApi>) -> Self {
        Self {
            tracker: RoomTracker::new(),
            host,
            bindings: HashMap::new(),
            parameters: BTreeMap::new(),
            config: None,
        }
    }

    pub fn tracker(&self) -> &RoomTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut RoomTracker {
        &mut self.tracker
    }

    pub fn is_loaded(&self) -> bool {
        self.config.is_some()
    }

    /// Replaces the active config. A previously loaded config is unloaded
    /// first (running its `OnUnload` commands); the new binding table is
    /// built completely before it becomes visible, so no event can observe a
    /// half-loaded set. Fires `OnLoad` once the new bindings are active.
    pub fn load_config(&mut self, config: RoomConfig) -> LoadReport {
        self.unload_config();

        let mut report = LoadReport::default();
        let mut bindings: HashMap<LifecycleEvent, Vec<Binding>> = HashMap::new();
        for event in LifecycleEvent::ALL {
            for raw_command in config.commands_for(event) {
                let call = parse_command(raw_command);
                if call.name.is_empty() {
                    report.issues.push(BindingIssue::EmptyCommand {
                        event,
                        command: raw_command.clone(),
                    });
                    continue;
                }
                match Action::from_name(&call.name) {
                    Some(action) => {
                        bindings.entry(event).or_default().push(Binding {
                            action,
                            args: call.args,
                        });
                        report.bindings_registered += 1;
                    }
                    None => report.issues.push(BindingIssue::UnknownAction {
                        event,
                        name: call.name,
                        command: raw_command.clone(),
                    }),
                }
            }
        }

        self.parameters = config.custom_parameters();
        self.bindings = bindings;
        self.config = Some(config);
        info!(
            "room config loaded: {} bindings, {} rejected",
            report.bindings_registered,
            report.issues.len()
        );
        for issue in &report.issues {
            debug!("rejected binding: {issue}");
        }

        let context = self.ambient_context();
        self.fire(LifecycleEvent::Load, &context);
        report
    }

    /// Drops the active config and all bindings. `OnUnload` commands run
    /// first, against the bindings that are about to be cleared. No-op when
    /// nothing is loaded.
    pub fn unload_config(&mut self) {
        if self.config.is_none() {
            return;
        }
        let context = self.ambient_context();
        self.fire(LifecycleEvent::Unload, &context);
        self.config = None;
        self.bindings.clear();
        self.parameters.clear();
        info!("room config unloaded");
    }

    /// Feeds an external room-state snapshot through the tracker and
    /// dispatches any resulting finish/improvement notifications. The host
    /// calls this on lobby entry, level load and every leaderboard update.
    pub fn process_room_state(
        &mut self,
        players: &[PlayerSnapshot],
        level: Option<&LevelSnapshot>,
    ) {
        let notifications = self.tracker.process_room_state(players, level);
        for notification in notifications {
            let (event, result) = match notification {
                TrackerNotification::PlayerFinished(result) => {
                    (LifecycleEvent::PlayerFinished, result)
                }
                TrackerNotification::PlayerImproved(result) => {
                    (LifecycleEvent::PlayerImproved, result)
                }
            };
            let context = self.result_context(&result);
            self.fire(event, &context);
        }
    }

    pub fn player_joined(&mut self, snapshot: &PlayerSnapshot) {
        self.tracker.add_player(snapshot);
        let Some(player) = self.tracker.get_player(snapshot.steam_id).cloned() else {
            return;
        };
        let mut context = self.bare_context();
        context.set_player(player);
        self.fire(LifecycleEvent::PlayerJoined, &context);
    }

    pub fn player_left(&mut self, steam_id: u64) {
        self.tracker.set_player_offline(steam_id);
        let Some(player) = self.tracker.get_player(steam_id).cloned() else {
            return;
        };
        let mut context = self.bare_context();
        context.set_player(player);
        self.fire(LifecycleEvent::PlayerLeft, &context);
    }

    /// The local client left the room; everyone we know about is offline.
    pub fn room_left(&mut self) {
        self.tracker.set_all_offline();
    }

    pub fn round_started(&mut self) {
        let context = self.ambient_context();
        self.fire(LifecycleEvent::RoundStart, &context);
    }

    pub fn round_ended(&mut self) {
        let context = self.ambient_context();
        self.fire(LifecycleEvent::RoundEnd, &context);
    }

    fn fire(&mut self, event: LifecycleEvent, context: &Context) {
        let Some(bindings) = self.bindings.get(&event) else {
            return;
        };
        for binding in bindings {
            binding
                .action
                .invoke(&binding.args, context, &mut self.tracker, self.host.as_ref());
        }
    }

    fn bare_context(&self) -> Context {
        Context::new(self.parameters.clone())
    }

    /// Context for events without a subject: custom parameters plus the
    /// current level, when one is known.
    fn ambient_context(&self) -> Context {
        let mut context = self.bare_context();
        if let Some(level) = self.tracker.get_current_level() {
            context.set_level(level.clone());
        }
        context
    }

    /// Context for finish/improvement events. Subject player and level are
    /// re-resolved through the tracker; a result whose player or level is no
    /// longer known yields empty subject fields rather than failing.
    fn result_context(&self, result: &BestResult) -> Context {
        let mut context = self.bare_context();
        context.set_result(result);
        if let Some(player) = self.tracker.get_player(result.steam_id) {
            context.set_player(player.clone());
        }
        if let Some(level) = self.tracker.get_level(&result.level_uid) {
            context.set_level(level.clone());
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::test_support::{HostCall, RecordingHost};

    fn engine() -> (RoomAutomation, std::rc::Rc<std::cell::RefCell<Vec<HostCall>>>) {
        let (host, calls) = RecordingHost::new();
        (RoomAutomation::new(Box::new(host)), calls)
    }

    fn config(raw: &str) -> RoomConfig {
        RoomConfig::from_json_str(raw).expect("config")
    }

    fn level(uid: &str) -> LevelSnapshot {
        LevelSnapshot {
            uid: uid.to_string(),
            name: format!("Level {uid}"),
            workshop_id: 31337,
            author: "Author".to_string(),
        }
    }

    fn player(steam_id: u64, name: &str, time_seconds: Option<f32>) -> PlayerSnapshot {
        PlayerSnapshot {
            steam_id,
            name: name.to_string(),
            leaderboard_time_seconds: time_seconds,
        }
    }

    fn global_chat(calls: &[HostCall]) -> Vec<String> {
        calls
            .iter()
            .filter_map(|call| match call {
                HostCall::GlobalChat { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn load_report_counts_bindings_and_rejects_unknown_actions() {
        let (mut engine, _calls) = engine();
        let report = engine.load_config(config(
            r#"{
                "OnRoundStart": [
                    "SendGlobalChatMessage(Bot;round start)",
                    "NoSuchAction(1)",
                    "(orphan args)"
                ]
            }"#,
        ));

        assert_eq!(report.bindings_registered, 1);
        assert_eq!(report.issues.len(), 2);
        assert!(matches!(
            &report.issues[0],
            BindingIssue::UnknownAction { event: LifecycleEvent::RoundStart, name, .. }
                if name == "NoSuchAction"
        ));
        assert!(matches!(
            &report.issues[1],
            BindingIssue::EmptyCommand { event: LifecycleEvent::RoundStart, .. }
        ));
        assert!(engine.is_loaded());
    }

    #[test]
    fn a_rejected_binding_does_not_abort_the_valid_ones() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "OnRoundStart": [
                    "Bogus()",
                    "SendGlobalChatMessage(Bot;still here)"
                ]
            }"#,
        ));
        engine.round_started();
        assert_eq!(global_chat(&calls.borrow()), ["still here"]);
    }

    #[test]
    fn load_fires_on_load_after_bindings_are_active() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{ "OnLoad": ["SendGlobalChatMessage(Bot;loaded)"] }"#,
        ));
        assert_eq!(global_chat(&calls.borrow()), ["loaded"]);
    }

    #[test]
    fn unload_runs_cleanup_commands_before_clearing() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{ "OnUnload": ["SendGlobalChatMessage(Bot;bye)"] }"#,
        ));
        engine.unload_config();
        assert_eq!(global_chat(&calls.borrow()), ["bye"]);
        assert!(!engine.is_loaded());

        // A second unload with nothing active is a no-op.
        engine.unload_config();
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn reloading_replaces_bindings_with_zero_residual_invocations() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "OnUnload": ["SendGlobalChatMessage(Bot;A cleanup)"],
                "OnRoundStart": ["SendGlobalChatMessage(Bot;from A)"]
            }"#,
        ));
        engine.load_config(config(
            r#"{ "OnRoundStart": ["SendGlobalChatMessage(Bot;from B)"] }"#,
        ));

        engine.round_started();
        engine.round_started();

        assert_eq!(
            global_chat(&calls.borrow()),
            ["A cleanup", "from B", "from B"]
        );
    }

    #[test]
    fn events_without_bindings_are_ignored() {
        let (mut engine, calls) = engine();
        engine.load_config(config("{}"));
        engine.round_started();
        engine.round_ended();
        engine.player_left(7);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn first_finish_sends_exactly_one_templated_chat_message() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "OnPlayerFinished": [
                    "SendGlobalChatMessage(Bot;{PLAYERNAME} finished in {TIME})"
                ]
            }"#,
        ));

        let snapshot = [player(42, "Speedy", Some(42.0))];
        engine.process_room_state(&snapshot, Some(&level("lvl1")));
        assert_eq!(global_chat(&calls.borrow()), ["Speedy finished in 42"]);

        // A second identical snapshot produces zero further calls.
        engine.process_room_state(&snapshot, Some(&level("lvl1")));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn improvement_fires_only_the_improved_binding() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "OnPlayerFinished": ["SendGlobalChatMessage(Bot;finish {TIME})"],
                "OnPlayerImproved": ["SendGlobalChatMessage(Bot;improved to {TIME})"]
            }"#,
        ));

        engine.process_room_state(&[player(42, "Speedy", Some(50.0))], Some(&level("lvl1")));
        engine.process_room_state(&[player(42, "Speedy", Some(47.5))], Some(&level("lvl1")));
        engine.process_room_state(&[player(42, "Speedy", Some(55.0))], Some(&level("lvl1")));

        assert_eq!(
            global_chat(&calls.borrow()),
            ["finish 50", "improved to 47.5"]
        );
    }

    #[test]
    fn finish_context_resolves_player_and_level_from_the_tracker() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "OnPlayerFinished": [
                    "SendGlobalChatMessage(Bot;{PLAYERNAME}@{LEVELNAME} uid={UID} ws={WORKSHOPID} by {AUTHOR})"
                ]
            }"#,
        ));

        engine.process_room_state(&[player(42, "Speedy", Some(40.0))], Some(&level("lvl1")));
        assert_eq!(
            global_chat(&calls.borrow()),
            ["Speedy@Level lvl1 uid=lvl1 ws=31337 by Author"]
        );
    }

    #[test]
    fn custom_parameters_are_merged_into_every_context() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "Parameters": ["{BOT};Race Bot"],
                "OnRoundStart": ["SendGlobalChatMessage({BOT};go)"]
            }"#,
        ));
        engine.round_started();
        assert_eq!(
            calls.borrow().as_slice(),
            [
                HostCall::GlobalChat {
                    prefix: "Race Bot".to_string(),
                    message: "go".to_string(),
                }
            ]
        );
    }

    #[test]
    fn round_events_resolve_the_current_level() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{ "OnRoundStart": ["SendGlobalChatMessage(Bot;now racing {LEVELNAME})"] }"#,
        ));

        engine.round_started();
        engine.process_room_state(&[], Some(&level("lvl1")));
        engine.round_started();

        assert_eq!(
            global_chat(&calls.borrow()),
            ["now racing ", "now racing Level lvl1"]
        );
    }

    #[test]
    fn joined_and_left_carry_the_subject_player() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "OnPlayerJoined": ["SendGlobalChatMessage(Bot;welcome {PLAYERNAME} ({STEAMID}))"],
                "OnPlayerLeft": ["SendGlobalChatMessage(Bot;{PLAYERNAME} left)"]
            }"#,
        ));

        engine.player_joined(&player(42, "Speedy", None));
        engine.player_left(42);
        // Unknown ids fire nothing.
        engine.player_left(99);

        assert_eq!(
            global_chat(&calls.borrow()),
            ["welcome Speedy (42)", "Speedy left"]
        );
        assert!(engine
            .tracker()
            .get_player(42)
            .is_some_and(|p| !p.is_online));
    }

    #[test]
    fn finish_context_is_snapshotted_before_bindings_run() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "OnPlayerFinished": [
                    "ClearAllTrackingData()",
                    "SendPlayerChatMessage(Bot;well done)",
                    "SendGlobalChatMessage(Bot;id is {STEAMID})"
                ]
            }"#,
        ));

        // The first binding wipes the tracker; the finish context was built
        // beforehand, so the subject survives for the remaining bindings of
        // this firing. The whisper still goes out; a fresh firing for a new
        // finish then sees the player again (re-registered by the snapshot).
        engine.process_room_state(&[player(42, "Speedy", Some(40.0))], Some(&level("lvl1")));
        assert_eq!(
            calls.borrow().as_slice(),
            [
                HostCall::PlayerChat {
                    steam_id: 42,
                    prefix: "Bot".to_string(),
                    message: "well done".to_string(),
                },
                HostCall::GlobalChat {
                    prefix: "Bot".to_string(),
                    message: "id is 42".to_string(),
                }
            ]
        );
    }

    #[test]
    fn actions_mutating_the_tracker_run_against_live_state() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "OnPlayerFinished": ["AddPlayerChampionshipPoints(3;false)"],
                "OnPlayerImproved": ["AddPlayerChampionshipPoints(1;false)"]
            }"#,
        ));

        engine.process_room_state(&[player(42, "Speedy", Some(50.0))], Some(&level("lvl1")));
        engine.process_room_state(&[player(42, "Speedy", Some(45.0))], Some(&level("lvl1")));

        let stored = engine.tracker().get_player(42).expect("player");
        assert_eq!((stored.points, stored.points_delta), (4, 1));
        assert_eq!(
            calls.borrow().as_slice(),
            [
                HostCall::SetChampionshipPoints {
                    steam_id: 42,
                    points: 3,
                    change: 3,
                    notify: false,
                },
                HostCall::SetChampionshipPoints {
                    steam_id: 42,
                    points: 4,
                    change: 1,
                    notify: false,
                }
            ]
        );
    }

    #[test]
    fn bindings_fire_in_registration_order() {
        let (mut engine, calls) = engine();
        engine.load_config(config(
            r#"{
                "OnRoundEnd": [
                    "SendGlobalChatMessage(Bot;first)",
                    "SendGlobalChatMessage(Bot;second)",
                    "SendGlobalChatMessage(Bot;third)"
                ]
            }"#,
        ));
        engine.round_ended();
        assert_eq!(global_chat(&calls.borrow()), ["first", "second", "third"]);
    }

    #[test]
    fn two_engines_stay_isolated() {
        let (mut engine_a, calls_a) = engine();
        let (mut engine_b, calls_b) = engine();
        engine_a.load_config(config(
            r#"{ "OnRoundStart": ["SendGlobalChatMessage(Bot;A)"] }"#,
        ));
        engine_b.load_config(config(
            r#"{ "OnRoundStart": ["SendGlobalChatMessage(Bot;B)"] }"#,
        ));

        engine_a.round_started();
        assert_eq!(global_chat(&calls_a.borrow()), ["A"]);
        assert!(global_chat(&calls_b.borrow()).is_empty());
    }

    #[test]
    fn room_left_flags_everyone_offline() {
        let (mut engine, _calls) = engine();
        engine.process_room_state(
            &[player(1, "P1", None), player(2, "P2", None)],
            Some(&level("lvl1")),
        );
        engine.room_left();
        assert!(engine.tracker().get_player(1).is_some_and(|p| !p.is_online));
        assert!(engine.tracker().get_player(2).is_some_and(|p| !p.is_online));
    }
}
