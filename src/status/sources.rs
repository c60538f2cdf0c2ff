// Read side of the two status channels

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::SourceError;

/// The two raw channels the resolver reads boss state from.
///
/// Either may fail or be empty at any time; the resolver treats both as "no
/// reading this tick".
pub trait StatusSource {
    /// Scoreboard display lines, top to bottom
    fn primary_lines(&self) -> Result<Vec<String>, SourceError>;

    /// Tab list entry names, in list order
    fn secondary_names(&self) -> Result<Vec<String>, SourceError>;
}

#[derive(Debug, Default)]
struct Snapshot {
    scoreboard: Option<Vec<String>>,
    tab_list: Option<Vec<String>>,
}

/// Latest scoreboard and tab list pushed by the session feed.
///
/// Cloning yields another handle to the same snapshot, so the feed reader can
/// keep updating it after the resolver took ownership of a handle.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    inner: Rc<RefCell<Snapshot>>,
}

impl FeedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_scoreboard(&self, lines: Vec<String>) {
        self.inner.borrow_mut().scoreboard = Some(lines);
    }

    pub fn update_tab_list(&self, names: Vec<String>) {
        self.inner.borrow_mut().tab_list = Some(names);
    }

    /// Forget both channels, e.g. after a world change
    pub fn clear(&self) {
        let mut snapshot = self.inner.borrow_mut();
        snapshot.scoreboard = None;
        snapshot.tab_list = None;
    }
}

impl StatusSource for FeedSnapshot {
    fn primary_lines(&self) -> Result<Vec<String>, SourceError> {
        self.inner
            .borrow()
            .scoreboard
            .clone()
            .ok_or(SourceError::NotRendered {
                source_name: "scoreboard",
            })
    }

    fn secondary_names(&self) -> Result<Vec<String>, SourceError> {
        self.inner
            .borrow()
            .tab_list
            .clone()
            .ok_or(SourceError::NotRendered {
                source_name: "tab list",
            })
    }
}
