// Shared harness for integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use endbrood::{
    CommandSink, Controller, Entity, FeedSnapshot, GameCommand, StatusResolver, Timings,
    WarpListStore,
};
use tempfile::TempDir;

pub const BROOD_PREFIX: &str = "§4Broodmother§7:🎁§7 ";
pub const PROT_PREFIX: &str = "§4Protector§7:🎁§7 ";

/// Outbound commands and feedback, shared between the test and the controller
#[derive(Clone, Default)]
pub struct SharedSink {
    commands: Rc<RefCell<Vec<String>>>,
    messages: Rc<RefCell<Vec<String>>>,
}

impl SharedSink {
    pub fn commands(&self) -> Vec<String> {
        self.commands.borrow().clone()
    }

    pub fn party_commands(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.starts_with("p "))
            .collect()
    }

    pub fn warps(&self) -> Vec<String> {
        self.commands()
            .into_iter()
            .filter(|c| c.starts_with("warp "))
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
        self.messages.borrow_mut().clear();
    }
}

impl CommandSink for SharedSink {
    fn send(&mut self, command: GameCommand) {
        self.commands.borrow_mut().push(command.to_command_line());
    }

    fn notify(&mut self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

pub struct TestSession {
    pub controller: Controller,
    pub feed: FeedSnapshot,
    pub sink: SharedSink,
    pub store_path: std::path::PathBuf,
    _dir: TempDir,
}

impl TestSession {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let store_path = dir.path().join("EndBrood").join("warp_lists.json");
        let feed = FeedSnapshot::new();
        let sink = SharedSink::default();
        let controller = Controller::new(
            Timings::default(),
            StatusResolver::new(Box::new(feed.clone())),
            WarpListStore::open(store_path.clone()),
            Box::new(sink.clone()),
        );
        Self {
            controller,
            feed,
            sink,
            store_path,
            _dir: dir,
        }
    }

    pub fn add_players(&self, entity: Entity, players: &[&str]) {
        for player in players {
            self.controller
                .store()
                .add(entity, player)
                .expect("store write");
        }
    }

    pub fn scoreboard(&self, brood: Option<&str>, prot: Option<&str>) {
        let mut lines = vec!["Spider's Den".to_string()];
        lines.extend(brood.map(|s| format!("{BROOD_PREFIX}{s}")));
        lines.extend(prot.map(|s| format!("{PROT_PREFIX}{s}")));
        self.feed.update_scoreboard(lines);
    }

    /// Tab list with `entries` placed after the 20 header slots
    pub fn tab_list(&self, entries: &[String]) {
        let mut names: Vec<String> = (0..20).map(|i| format!("header {i}")).collect();
        names.extend(entries.iter().cloned());
        self.feed.update_tab_list(names);
    }

    pub fn advance_ms(&mut self, ms: u64) {
        self.controller.advance(Duration::from_millis(ms));
    }
}
