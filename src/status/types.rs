// Core types for boss state tracking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EndBroodError;

/// The two tracked bosses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Broodmother,
    Protector,
}

/// Lifecycle phase of a boss, in rank order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BossPhase {
    Dead,
    /// Precursor: "Imminent" / "Awakening"
    Intermediate,
    /// Spawned and engageable: "Alive" / "Summoned"
    Active,
}

impl BossPhase {
    /// Explicit total order used by the anti-regression rule.
    pub const fn rank(self) -> u8 {
        match self {
            BossPhase::Dead => 0,
            BossPhase::Intermediate => 1,
            BossPhase::Active => 2,
        }
    }
}

impl Entity {
    pub const ALL: [Entity; 2] = [Entity::Broodmother, Entity::Protector];

    pub fn display_name(self) -> &'static str {
        match self {
            Entity::Broodmother => "Broodmother",
            Entity::Protector => "Protector",
        }
    }

    /// Section name in the warp lists document
    pub fn list_key(self) -> &'static str {
        match self {
            Entity::Broodmother => "broodmother",
            Entity::Protector => "protector",
        }
    }

    /// Scoreboard line prefix
    pub fn primary_prefix(self) -> &'static str {
        match self {
            Entity::Broodmother => "§4Broodmother§7:🎁§7 ",
            Entity::Protector => "§4Protector§7:🎁§7 ",
        }
    }

    /// Tab list entry prefix
    pub fn secondary_prefix(self) -> &'static str {
        match self {
            Entity::Broodmother => "§r Broodmother: §r",
            Entity::Protector => "§r Protector: §r",
        }
    }

    /// State text the boss reports for each phase
    pub fn state_name(self, phase: BossPhase) -> &'static str {
        match (self, phase) {
            (_, BossPhase::Dead) => "Dead",
            (Entity::Broodmother, BossPhase::Intermediate) => "Imminent",
            (Entity::Broodmother, BossPhase::Active) => "Alive",
            (Entity::Protector, BossPhase::Intermediate) => "Awakening",
            (Entity::Protector, BossPhase::Active) => "Summoned",
        }
    }

    /// Parse the operator's entity argument (`brood` / `prot`)
    pub fn parse(arg: &str) -> Result<Self, EndBroodError> {
        match arg.to_lowercase().as_str() {
            "brood" | "broodmother" => Ok(Entity::Broodmother),
            "prot" | "protector" => Ok(Entity::Protector),
            _ => Err(EndBroodError::UnknownEntity(arg.to_string())),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for Entity {
    type Err = EndBroodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Entity::parse(s)
    }
}

/// A resolved boss state: the raw text plus its classified phase.
///
/// Text that names no known phase (e.g. "None") stays unrecognized and ranks
/// below `Dead`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BossStatus {
    raw: String,
    phase: Option<BossPhase>,
}

impl BossStatus {
    pub fn classify(entity: Entity, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let phase = [BossPhase::Active, BossPhase::Intermediate, BossPhase::Dead]
            .into_iter()
            .find(|phase| raw.contains(entity.state_name(*phase)));
        Self { raw, phase }
    }

    pub fn dead(entity: Entity) -> Self {
        Self::classify(entity, entity.state_name(BossPhase::Dead))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn phase(&self) -> Option<BossPhase> {
        self.phase
    }

    pub fn is_pending(&self) -> bool {
        self.phase == Some(BossPhase::Intermediate)
    }

    /// `None` (unrecognized) orders below every ranked phase.
    pub fn rank(&self) -> Option<u8> {
        self.phase.map(BossPhase::rank)
    }
}

impl fmt::Display for BossStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Last known state of one boss
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityState {
    /// Undefined until the first reading
    pub value: Option<BossStatus>,
    /// Whether the last accepted reading came from the scoreboard
    pub source_is_primary: bool,
    pub changed_at: Option<DateTime<Utc>>,
}

impl EntityState {
    pub fn is_pending(&self) -> bool {
        self.value.as_ref().is_some_and(BossStatus::is_pending)
    }

    /// Store a new value. Returns the previous one.
    pub fn record(&mut self, value: BossStatus) -> Option<BossStatus> {
        self.changed_at = Some(Utc::now());
        self.value.replace(value)
    }
}
