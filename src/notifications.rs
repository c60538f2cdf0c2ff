//! Inbound chat notifications
//!
//! Chat text is matched by literal substring after formatting codes are removed.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

pub const INVITE_FAILED_UNREACHABLE: &str = "couldn't invite that player!";
pub const INVITE_FAILED_ALREADY_GROUPED: &str = "is already in another party!";
pub const INVITE_FAILED_OFFLINE: &str = "is not online!";

pub const INVITE_FAILURES: [&str; 3] = [
    INVITE_FAILED_UNREACHABLE,
    INVITE_FAILED_ALREADY_GROUPED,
    INVITE_FAILED_OFFLINE,
];

pub const PLAYER_JOINED: &str = "has joined the party.";
const PLAYER_JOINED_SPLIT: &str = " has joined";

pub const PROTECTOR_RISING: &str =
    "The ground begins to shake as an Endstone Protector rises from below!";
pub const PROTECTOR_SPAWNED: &str = "The Protector has spawned!";
pub const PROTECTOR_DEFEATED: &str = "ENDSTONE PROTECTOR DOWN!";

static FORMATTING_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[§&][0-9a-fk-orA-FK-OR]").expect("valid formatting regex"));

/// A chat message the session reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A party invite could not be delivered
    InviteFailed { reason: &'static str },
    /// Someone accepted the party invite
    PlayerJoined { player: String },
    /// The Protector is about to spawn
    ProtectorRising,
    /// The Protector finished spawning
    ProtectorSpawned,
    /// The Protector was killed
    ProtectorDefeated,
}

/// Remove `§x` / `&x` color and style codes
pub fn strip_formatting(text: &str) -> Cow<'_, str> {
    FORMATTING_CODE.replace_all(text, "")
}

impl Notification {
    /// Classify a raw chat line. Returns `None` for chat the session ignores.
    pub fn parse(raw: &str) -> Option<Self> {
        let message = strip_formatting(raw);

        if let Some(reason) = INVITE_FAILURES
            .into_iter()
            .find(|phrase| message.contains(phrase))
        {
            return Some(Notification::InviteFailed { reason });
        }

        if message.contains(PLAYER_JOINED) {
            let player = message
                .split(PLAYER_JOINED_SPLIT)
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            return Some(Notification::PlayerJoined { player });
        }

        if message.contains(PROTECTOR_RISING) {
            Some(Notification::ProtectorRising)
        } else if message.contains(PROTECTOR_SPAWNED) {
            Some(Notification::ProtectorSpawned)
        } else if message.contains(PROTECTOR_DEFEATED) {
            Some(Notification::ProtectorDefeated)
        } else {
            None
        }
    }

    /// Notifications consumed by an in-flight party run
    pub fn is_party_event(&self) -> bool {
        matches!(
            self,
            Notification::InviteFailed { .. } | Notification::PlayerJoined { .. }
        )
    }
}
