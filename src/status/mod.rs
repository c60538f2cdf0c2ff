// Boss status tracking
//
// Resolves one authoritative state per boss from the scoreboard and tab list.

pub mod types;
pub mod sources;
pub mod resolver;

pub use types::{BossPhase, BossStatus, Entity, EntityState};
pub use sources::{FeedSnapshot, StatusSource};
pub use resolver::StatusResolver;
