// Test doubles for the outbound side - no side effects

use std::cell::RefCell;
use std::rc::Rc;

use crate::commands::{CommandSink, GameCommand};

/// Records every command and feedback message.
///
/// Clones share the same log, so a test can keep one handle while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: Rc<RefCell<Vec<GameCommand>>>,
    messages: Rc<RefCell<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<GameCommand> {
        self.sent.borrow().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .map(GameCommand::to_command_line)
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
        self.messages.borrow_mut().clear();
    }
}

impl CommandSink for RecordingSink {
    fn send(&mut self, command: GameCommand) {
        self.sent.borrow_mut().push(command);
    }

    fn notify(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
