//! Outbound game commands
//!
//! Commands are fire-and-forget: the sink never reports whether the game
//! accepted them.

use std::fmt;

use crate::cycler::Location;

/// A command issued to the game client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameCommand {
    /// Invite every participant in one `p` command
    PartyInvite(Vec<String>),
    PartyWarp,
    PartyDisband,
    /// Warp the player to one of the two cycle locations
    Warp(Location),
}

impl GameCommand {
    /// Literal command line, without the leading slash
    pub fn to_command_line(&self) -> String {
        match self {
            GameCommand::PartyInvite(players) => format!("p {}", players.join(" ")),
            GameCommand::PartyWarp => "p warp".to_string(),
            GameCommand::PartyDisband => "p disband".to_string(),
            GameCommand::Warp(location) => format!("warp {}", location.warp_target()),
        }
    }
}

impl fmt::Display for GameCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_command_line())
    }
}

/// Where commands and operator feedback go
pub trait CommandSink {
    fn send(&mut self, command: GameCommand);

    /// Operator-facing chat feedback; never interpreted by the game
    fn notify(&mut self, message: &str);
}

/// Side-effect handles passed into the core components for one callback
pub struct Effects<'a> {
    pub scheduler: &'a mut dyn crate::scheduler::Scheduler,
    pub commands: &'a mut dyn CommandSink,
}
