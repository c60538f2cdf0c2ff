//! Status Resolver
//!
//! Reconciles the scoreboard (authoritative) and the tab list (lagging fallback)
//! into one reading per boss per tick.

use tracing::{debug, trace};

use super::sources::StatusSource;
use super::types::{BossStatus, Entity, EntityState};

/// Leading tab list entries are the header and the player's own entries.
pub const SECONDARY_SCAN_OFFSET: usize = 20;

/// Formatting code trailing every tab list state
const SECONDARY_SUFFIX_CHARS: usize = 2;

pub struct StatusResolver {
    source: Box<dyn StatusSource>,
}

impl StatusResolver {
    pub fn new(source: Box<dyn StatusSource>) -> Self {
        Self { source }
    }

    /// Resolve the current state of `entity`.
    ///
    /// Returns `None` when neither channel has information this tick; that is
    /// "no update", never a state. `state` supplies the stored value for the
    /// anti-regression check, and its `source_is_primary` flag is updated here.
    pub fn resolve(&self, entity: Entity, state: &mut EntityState) -> Option<BossStatus> {
        let lines = match self.source.primary_lines() {
            Ok(lines) if !lines.is_empty() => lines,
            Ok(_) => {
                trace!(entity = %entity, "Scoreboard empty");
                return None;
            }
            Err(e) => {
                trace!(entity = %entity, error = %e, "Scoreboard unavailable");
                return None;
            }
        };

        if let Some(raw) = primary_reading(entity, &lines) {
            state.source_is_primary = true;
            return Some(BossStatus::classify(entity, raw));
        }

        let names = match self.source.secondary_names() {
            Ok(names) if !names.is_empty() => names,
            Ok(_) => return None,
            Err(e) => {
                trace!(entity = %entity, error = %e, "Tab list unavailable");
                return None;
            }
        };

        let reading = BossStatus::classify(entity, secondary_reading(entity, &names)?);

        if state.source_is_primary {
            if let Some(current) = &state.value {
                if reading.rank() < current.rank() {
                    debug!(
                        entity = %entity,
                        current = %current,
                        rejected = %reading,
                        "Ignoring lagging tab list state"
                    );
                    return Some(current.clone());
                }
            }
        }

        state.source_is_primary = false;
        Some(reading)
    }
}

/// State text of the first scoreboard line carrying the entity's label
fn primary_reading(entity: Entity, lines: &[String]) -> Option<String> {
    let prefix = entity.primary_prefix();
    lines
        .iter()
        .find_map(|line| line.strip_prefix(prefix))
        .map(str::to_string)
}

/// State text of the first tab entry past the header carrying the entity's label
fn secondary_reading(entity: Entity, names: &[String]) -> Option<String> {
    let prefix = entity.secondary_prefix();
    let rest = names
        .iter()
        .skip(SECONDARY_SCAN_OFFSET)
        .find_map(|name| name.strip_prefix(prefix))?;

    let keep = rest.chars().count().saturating_sub(SECONDARY_SUFFIX_CHARS);
    Some(rest.chars().take(keep).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::status::types::BossPhase;

    struct ScriptedSource {
        primary: Result<Vec<String>, SourceError>,
        secondary: Result<Vec<String>, SourceError>,
    }

    impl StatusSource for ScriptedSource {
        fn primary_lines(&self) -> Result<Vec<String>, SourceError> {
            self.primary.clone()
        }

        fn secondary_names(&self) -> Result<Vec<String>, SourceError> {
            self.secondary.clone()
        }
    }

    fn resolver(
        primary: Result<Vec<String>, SourceError>,
        secondary: Result<Vec<String>, SourceError>,
    ) -> StatusResolver {
        StatusResolver::new(Box::new(ScriptedSource { primary, secondary }))
    }

    fn scoreboard(lines: &[&str]) -> Result<Vec<String>, SourceError> {
        Ok(lines.iter().map(|l| l.to_string()).collect())
    }

    /// Tab list with 20 filler entries before the given ones
    fn tab_list(entries: &[&str]) -> Result<Vec<String>, SourceError> {
        let mut names: Vec<String> = (0..SECONDARY_SCAN_OFFSET)
            .map(|i| format!("§r player{i}§r"))
            .collect();
        names.extend(entries.iter().map(|e| e.to_string()));
        Ok(names)
    }

    #[test]
    fn test_primary_line_wins() {
        let resolver = resolver(
            scoreboard(&["§7Spider's Den", "§4Broodmother§7:🎁§7 Imminent"]),
            tab_list(&["§r Broodmother: §rDead§r"]),
        );
        let mut state = EntityState::default();

        let status = resolver.resolve(Entity::Broodmother, &mut state).unwrap();
        assert_eq!(status.raw(), "Imminent");
        assert_eq!(status.phase(), Some(BossPhase::Intermediate));
        assert!(state.source_is_primary);
    }

    #[test]
    fn test_fallback_to_secondary_source() {
        let resolver = resolver(
            scoreboard(&["§7The End"]),
            tab_list(&["§r Protector: §rAwakening§r"]),
        );
        let mut state = EntityState::default();

        let status = resolver.resolve(Entity::Protector, &mut state).unwrap();
        assert_eq!(status.raw(), "Awakening");
        assert!(!state.source_is_primary);
    }

    #[test]
    fn test_no_match_anywhere_is_no_reading() {
        let resolver = resolver(scoreboard(&["§7The End"]), tab_list(&["§r Zealots: §r5§r"]));
        let mut state = EntityState {
            value: Some(BossStatus::classify(Entity::Protector, "Awakening")),
            ..Default::default()
        };
        let before = state.clone();

        assert!(resolver.resolve(Entity::Protector, &mut state).is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn test_secondary_scan_skips_header_entries() {
        // Entry sits inside the first 20 names only
        let names: Vec<String> = std::iter::once("§r Protector: §rSummoned§r".to_string())
            .chain((0..25).map(|i| format!("§r filler{i}§r")))
            .collect();
        let resolver = resolver(scoreboard(&["§7The End"]), Ok(names));

        assert!(resolver
            .resolve(Entity::Protector, &mut EntityState::default())
            .is_none());
    }

    #[test]
    fn test_lagging_secondary_cannot_regress_primary_state() {
        let resolver = resolver(
            scoreboard(&["§7The End"]),
            tab_list(&["§r Broodmother: §rDead§r"]),
        );
        let mut state = EntityState {
            value: Some(BossStatus::classify(Entity::Broodmother, "Alive")),
            source_is_primary: true,
            changed_at: None,
        };

        let status = resolver.resolve(Entity::Broodmother, &mut state).unwrap();
        assert_eq!(status.raw(), "Alive");
        assert!(state.source_is_primary);
    }

    #[test]
    fn test_secondary_may_advance_primary_state() {
        let resolver = resolver(
            scoreboard(&["§7The End"]),
            tab_list(&["§r Broodmother: §rAlive§r"]),
        );
        let mut state = EntityState {
            value: Some(BossStatus::classify(Entity::Broodmother, "Imminent")),
            source_is_primary: true,
            changed_at: None,
        };

        let status = resolver.resolve(Entity::Broodmother, &mut state).unwrap();
        assert_eq!(status.raw(), "Alive");
        assert!(!state.source_is_primary);
    }

    #[test]
    fn test_secondary_may_regress_secondary_state() {
        let resolver = resolver(
            scoreboard(&["§7The End"]),
            tab_list(&["§r Broodmother: §rDead§r"]),
        );
        let mut state = EntityState {
            value: Some(BossStatus::classify(Entity::Broodmother, "Alive")),
            source_is_primary: false,
            changed_at: None,
        };

        let status = resolver.resolve(Entity::Broodmother, &mut state).unwrap();
        assert_eq!(status.raw(), "Dead");
    }

    #[test]
    fn test_source_failures_are_swallowed() {
        let failing = || SourceError::ReadFailed {
            message: "render thread busy".to_string(),
        };
        let mut state = EntityState::default();

        assert!(resolver(Err(failing()), tab_list(&["§r Protector: §rDead§r"]))
            .resolve(Entity::Protector, &mut state)
            .is_none());
        assert!(resolver(scoreboard(&["§7The End"]), Err(failing()))
            .resolve(Entity::Protector, &mut state)
            .is_none());
    }

    #[test]
    fn test_empty_scoreboard_is_no_reading() {
        let resolver = resolver(Ok(Vec::new()), tab_list(&["§r Protector: §rDead§r"]));
        assert!(resolver
            .resolve(Entity::Protector, &mut EntityState::default())
            .is_none());
    }

    #[test]
    fn test_short_secondary_state_trims_to_empty() {
        assert_eq!(
            secondary_reading(
                Entity::Protector,
                &tab_list(&["§r Protector: §rx"]).unwrap()
            ),
            Some(String::new())
        );
    }
}
