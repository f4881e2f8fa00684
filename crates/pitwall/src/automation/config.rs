use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// The fixed set of lifecycle events a config can bind commands to. The set
/// is closed; an unrecognized event name in a config document fails
/// deserialization instead of being silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Load,
    Unload,
    PlayerJoined,
    PlayerLeft,
    RoundStart,
    RoundEnd,
    PlayerFinished,
    PlayerImproved,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 8] = [
        LifecycleEvent::Load,
        LifecycleEvent::Unload,
        LifecycleEvent::PlayerJoined,
        LifecycleEvent::PlayerLeft,
        LifecycleEvent::RoundStart,
        LifecycleEvent::RoundEnd,
        LifecycleEvent::PlayerFinished,
        LifecycleEvent::PlayerImproved,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Load => "OnLoad",
            Self::Unload => "OnUnload",
            Self::PlayerJoined => "OnPlayerJoined",
            Self::PlayerLeft => "OnPlayerLeft",
            Self::RoundStart => "OnRoundStart",
            Self::RoundEnd => "OnRoundEnd",
            Self::PlayerFinished => "OnPlayerFinished",
            Self::PlayerImproved => "OnPlayerImproved",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Operator-declared automation document: custom parameter declarations plus
/// one ordered command list per lifecycle event. Field names mirror the JSON
/// document written by operators.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields, default)]
pub struct RoomConfig {
    pub parameters: Vec<String>,
    pub on_load: Vec<String>,
    pub on_unload: Vec<String>,
    pub on_player_joined: Vec<String>,
    pub on_player_left: Vec<String>,
    pub on_round_start: Vec<String>,
    pub on_round_end: Vec<String>,
    pub on_player_finished: Vec<String>,
    pub on_player_improved: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse room config json: {0}")]
    Json(#[from] serde_json::Error),
}

impl RoomConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn commands_for(&self, event: LifecycleEvent) -> &[String] {
        match event {
            LifecycleEvent::Load => &self.on_load,
            LifecycleEvent::Unload => &self.on_unload,
            LifecycleEvent::PlayerJoined => &self.on_player_joined,
            LifecycleEvent::PlayerLeft => &self.on_player_left,
            LifecycleEvent::RoundStart => &self.on_round_start,
            LifecycleEvent::RoundEnd => &self.on_round_end,
            LifecycleEvent::PlayerFinished => &self.on_player_finished,
            LifecycleEvent::PlayerImproved => &self.on_player_improved,
        }
    }

    /// Parses the `KEY;VALUE` parameter declarations. A declaration without a
    /// separator or with an empty key is skipped with a warning; the first
    /// declaration of a key wins.
    pub fn custom_parameters(&self) -> BTreeMap<String, String> {
        let mut parameters = BTreeMap::new();
        for declaration in &self.parameters {
            let Some((key, value)) = declaration.split_once(';') else {
                warn!("ignoring parameter declaration without a ';': '{declaration}'");
                continue;
            };
            if key.is_empty() {
                warn!("ignoring parameter declaration with an empty key: '{declaration}'");
                continue;
            }
            // Only the first value segment counts; a second ';' starts a
            // tail that is dropped.
            let value = value.split(';').next().unwrap_or_default();
            parameters
                .entry(key.to_string())
                .or_insert_with(|| value.to_string());
        }
        parameters
    }
}
