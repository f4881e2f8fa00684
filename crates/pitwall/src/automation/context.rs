use std::collections::BTreeMap;

use crate::tracker::{BestResult, Level, Player};

/// Per-invocation value bag handed to every action. Built fresh for each
/// event firing and never persisted. Subject player, result time and level
/// are optional; absent subjects substitute as zero/empty in templates.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub player: Option<Player>,
    pub level: Option<Level>,
    pub time_seconds: Option<f32>,
    pub parameters: BTreeMap<String, String>,
}

impl Context {
    pub fn new(parameters: BTreeMap<String, String>) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    pub fn set_player(&mut self, player: Player) {
        self.player = Some(player);
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = Some(level);
    }

    pub fn set_result(&mut self, result: &BestResult) {
        self.time_seconds = Some(result.time_seconds);
    }

    /// Substitutes the fixed placeholder tokens and then every custom
    /// parameter key, in that order. Each key is applied in a single pass;
    /// text produced by an earlier substitution is never re-scanned by a
    /// later key.
    pub fn apply_tokens(&self, template: &str) -> String {
        let mut segments = vec![Segment {
            text: template.to_string(),
            substituted: false,
        }];
        for (token, value) in self.fixed_tokens() {
            replace_in_literals(&mut segments, token, &value);
        }
        for (key, value) in &self.parameters {
            replace_in_literals(&mut segments, key, value);
        }
        segments.into_iter().map(|segment| segment.text).collect()
    }

    fn fixed_tokens(&self) -> [(&'static str, String); 9] {
        let steam_id = self.player.as_ref().map(|p| p.steam_id).unwrap_or(0);
        let player_name = self
            .player
            .as_ref()
            .map(|p| p.name.clone())
            .unwrap_or_default();
        let points = self.player.as_ref().map(|p| p.points).unwrap_or(0);
        let points_delta = self.player.as_ref().map(|p| p.points_delta).unwrap_or(0);
        let time = self.time_seconds.unwrap_or(0.0);
        let uid = self
            .level
            .as_ref()
            .map(|l| l.uid.clone())
            .unwrap_or_default();
        let workshop_id = self.level.as_ref().map(|l| l.workshop_id).unwrap_or(0);
        let level_name = self
            .level
            .as_ref()
            .map(|l| l.name.clone())
            .unwrap_or_default();
        let author = self
            .level
            .as_ref()
            .map(|l| l.author.clone())
            .unwrap_or_default();

        [
            ("{STEAMID}", steam_id.to_string()),
            ("{PLAYERNAME}", player_name),
            ("{TIME}", time.to_string()),
            ("{UID}", uid),
            ("{WORKSHOPID}", workshop_id.to_string()),
            ("{LEVELNAME}", level_name),
            ("{AUTHOR}", author),
            ("{POINTS}", points.to_string()),
            ("{POINTSDIF}", points_delta.to_string()),
        ]
    }
}

#[derive(Debug)]
struct Segment {
    text: String,
    substituted: bool,
}

fn replace_in_literals(segments: &mut Vec<Segment>, token: &str, value: &str) {
    if token.is_empty() {
        return;
    }
    let mut replaced = Vec::with_capacity(segments.len());
    for segment in segments.drain(..) {
        if segment.substituted || !segment.text.contains(token) {
            replaced.push(segment);
            continue;
        }
        let mut rest = segment.text.as_str();
        while let Some(at) = rest.find(token) {
            if at > 0 {
                replaced.push(Segment {
                    text: rest[..at].to_string(),
                    substituted: false,
                });
            }
            replaced.push(Segment {
                text: value.to_string(),
                substituted: true,
            });
            rest = &rest[at + token.len()..];
        }
        if !rest.is_empty() {
            replaced.push(Segment {
                text: rest.to_string(),
                substituted: false,
            });
        }
    }
    *segments = replaced;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(steam_id: u64, name: &str) -> Player {
        Player {
            steam_id,
            name: name.to_string(),
            is_online: true,
            points: 12,
            points_delta: 3,
        }
    }

    fn level(uid: &str) -> Level {
        Level {
            uid: uid.to_string(),
            name: "Canyon Sprint".to_string(),
            workshop_id: 777,
            author: "mapper".to_string(),
        }
    }

    #[test]
    fn substitutes_fixed_tokens_and_custom_parameters_in_order() {
        let mut parameters = BTreeMap::new();
        parameters.insert("{TAG}".to_string(), "X".to_string());
        let mut context = Context::new(parameters);
        context.set_player(player(42, "Speedy"));

        assert_eq!(context.apply_tokens("Hi {STEAMID} {TAG}"), "Hi 42 X");
    }

    #[test]
    fn absent_subjects_substitute_zero_and_empty() {
        let context = Context::new(BTreeMap::new());
        assert_eq!(
            context.apply_tokens("{STEAMID}|{PLAYERNAME}|{TIME}|{UID}|{POINTS}|{POINTSDIF}"),
            "0||0||0|0"
        );
    }

    #[test]
    fn full_subject_renders_every_token() {
        let mut context = Context::new(BTreeMap::new());
        context.set_player(player(42, "Speedy"));
        context.set_level(level("lvl1"));
        context.time_seconds = Some(42.0);

        let rendered = context.apply_tokens(
            "{PLAYERNAME} drove {LEVELNAME} ({UID}/{WORKSHOPID}) by {AUTHOR} in {TIME}, \
             {POINTS} pts ({POINTSDIF})",
        );
        assert_eq!(
            rendered,
            "Speedy drove Canyon Sprint (lvl1/777) by mapper in 42, 12 pts (3)"
        );
    }

    #[test]
    fn fractional_times_keep_their_fraction() {
        let mut context = Context::new(BTreeMap::new());
        context.time_seconds = Some(41.25);
        assert_eq!(context.apply_tokens("{TIME}"), "41.25");
    }

    #[test]
    fn substituted_text_is_not_rescanned_by_later_keys() {
        let mut parameters = BTreeMap::new();
        parameters.insert("{TAG}".to_string(), "wins".to_string());
        let mut context = Context::new(parameters);
        // A hostile display name containing a later token must come through
        // verbatim instead of being expanded again.
        context.set_player(player(7, "{TIME} {TAG}"));
        context.time_seconds = Some(9.5);

        assert_eq!(
            context.apply_tokens("{PLAYERNAME} finished in {TIME}"),
            "{TIME} {TAG} finished in 9.5"
        );
    }

    #[test]
    fn custom_parameter_values_are_not_rescanned_either() {
        let mut parameters = BTreeMap::new();
        parameters.insert("{A}".to_string(), "{B}".to_string());
        parameters.insert("{B}".to_string(), "deep".to_string());
        let context = Context::new(parameters);

        assert_eq!(context.apply_tokens("{A} {B}"), "{B} deep");
    }

    #[test]
    fn repeated_tokens_are_all_replaced() {
        let mut context = Context::new(BTreeMap::new());
        context.set_player(player(5, "Dot"));
        assert_eq!(context.apply_tokens("{STEAMID}{STEAMID}"), "55");
    }

    #[test]
    fn template_without_tokens_passes_through() {
        let context = Context::new(BTreeMap::new());
        assert_eq!(context.apply_tokens("plain text"), "plain text");
    }
}
