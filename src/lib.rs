// EndBrood Library - boss state tracking and party warp automation
// This exposes the core components for testing and integration

pub mod cli;
pub mod commands;
pub mod config;
pub mod console;
pub mod controller;
pub mod cycler;
pub mod error;
pub mod feed;
pub mod notifications;
pub mod orchestrator;
pub mod runtime;
pub mod scheduler;
pub mod status;
pub mod telemetry;
pub mod warp_list;

#[cfg(test)]
mod mocks;

// Re-export key types for easy access
pub use commands::{CommandSink, Effects, GameCommand};
pub use config::{EndBroodConfig, Timings};
pub use controller::Controller;
pub use cycler::{Blocker, Location, LocationCycler};
pub use error::{EndBroodError, FeedError, SourceError, StoreError};
pub use feed::{decode_frame, FeedWriter, InboundFrame, OutboundFrame};
pub use notifications::Notification;
pub use orchestrator::{GroupOrchestrator, RunPhase};
pub use runtime::Session;
pub use scheduler::{Scheduler, Timer, TimerHandle, TimerQueue};
pub use status::{BossPhase, BossStatus, Entity, EntityState, FeedSnapshot, StatusResolver};
pub use telemetry::init_telemetry;
pub use warp_list::{ListChange, WarpList, WarpListStore, WarpLists};
