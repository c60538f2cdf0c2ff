//! Session feed wire protocol
//!
//! The game client bridge and this process exchange JSON lines, one frame per
//! line, tagged by `type`. Inbound frames carry the two status channels, chat and
//! operator commands; outbound frames carry game commands and operator feedback.

use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, error};

use crate::commands::{CommandSink, GameCommand};
use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    /// Full scoreboard, top to bottom
    Scoreboard { lines: Vec<String> },
    /// Full tab list, in list order
    TabList { names: Vec<String> },
    /// One received chat line, formatting codes included
    Chat { message: String },
    /// One operator slash command
    Command { line: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Command { command: String },
    Chat { message: String },
}

impl From<&GameCommand> for OutboundFrame {
    fn from(command: &GameCommand) -> Self {
        OutboundFrame::Command {
            command: command.to_command_line(),
        }
    }
}

/// Decode one inbound line. Blank lines yield `None`.
pub fn decode_frame(line: &str) -> Result<Option<InboundFrame>, FeedError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

pub fn encode_frame(frame: &OutboundFrame) -> Result<String, FeedError> {
    Ok(serde_json::to_string(frame)?)
}

/// Writes outbound frames as JSON lines, flushing after each one.
///
/// Commands are fire-and-forget, so write failures are logged and dropped.
#[derive(Debug)]
pub struct FeedWriter<W: Write> {
    out: W,
}

impl<W: Write> FeedWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, frame: &OutboundFrame) {
        if let Err(e) = self.try_emit(frame) {
            error!(error = %e, ?frame, "Failed to write feed frame");
        }
    }

    fn try_emit(&mut self, frame: &OutboundFrame) -> Result<(), FeedError> {
        let line = encode_frame(frame)?;
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> CommandSink for FeedWriter<W> {
    fn send(&mut self, command: GameCommand) {
        debug!(command = %command, "Sending command");
        self.emit(&OutboundFrame::from(&command));
    }

    fn notify(&mut self, message: &str) {
        self.emit(&OutboundFrame::Chat {
            message: message.to_string(),
        });
    }
}
