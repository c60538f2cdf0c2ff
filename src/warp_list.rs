//! Warp-List Store
//!
//! Per-boss party lists persisted as one small JSON document. Every mutation is
//! a read-modify-write of the whole document; nothing is cached in memory.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::error::StoreError;
use crate::status::Entity;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

/// One boss's party list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarpList {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub players: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for WarpList {
    fn default() -> Self {
        Self {
            enabled: true,
            players: Vec::new(),
        }
    }
}

impl WarpList {
    /// Append `player` unless already listed. Returns whether the list changed.
    pub fn add(&mut self, player: &str) -> bool {
        if self.contains(player) {
            return false;
        }
        self.players.push(player.to_string());
        true
    }

    /// Remove `player` if listed. Returns whether the list changed.
    pub fn remove(&mut self, player: &str) -> bool {
        match self.players.iter().position(|p| p == player) {
            Some(index) => {
                self.players.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, player: &str) -> bool {
        self.players.iter().any(|p| p == player)
    }

    /// Players to party with, if this list should be used at all
    pub fn party_members(&self) -> Option<&[String]> {
        (self.enabled && !self.players.is_empty()).then_some(self.players.as_slice())
    }
}

/// The persisted document: one section per boss
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarpLists {
    #[serde(default)]
    pub broodmother: WarpList,
    #[serde(default)]
    pub protector: WarpList,
}

impl WarpLists {
    pub fn get(&self, entity: Entity) -> &WarpList {
        match entity {
            Entity::Broodmother => &self.broodmother,
            Entity::Protector => &self.protector,
        }
    }

    pub fn get_mut(&mut self, entity: Entity) -> &mut WarpList {
        match entity {
            Entity::Broodmother => &mut self.broodmother,
            Entity::Protector => &mut self.protector,
        }
    }

    /// Four-space indented JSON, the layout users edit by hand
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, StoreError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        Ok(buf)
    }
}

/// Outcome of a membership change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    Added,
    AlreadyPresent,
    Removed,
    NotFound,
}

/// Raw document storage, separated for testing
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait DocumentStorage {
    fn read(&self) -> Result<String, StoreError>;

    fn write(&self, contents: &[u8]) -> Result<(), StoreError>;

    /// Human readable location for diagnostics
    fn location(&self) -> String;
}

/// Document on the local file system, replaced atomically on write
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentStorage for FileStorage {
    fn read(&self) -> Result<String, StoreError> {
        Ok(std::fs::read_to_string(&self.path)?)
    }

    fn write(&self, contents: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::PersistFailed {
                path: self.path.display().to_string(),
                reason: e.error.to_string(),
            })?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct WarpListStore {
    storage: Box<dyn DocumentStorage>,
}

impl WarpListStore {
    pub fn new(storage: Box<dyn DocumentStorage>) -> Self {
        Self { storage }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileStorage::new(path)))
    }

    /// Read the document, falling back to defaults if it is missing or corrupt.
    pub fn load(&self) -> WarpLists {
        let contents = match self.storage.read() {
            Ok(contents) => contents,
            Err(e) => {
                debug!(location = %self.storage.location(), error = %e, "Warp lists unreadable, using defaults");
                return WarpLists::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            debug!(location = %self.storage.location(), error = %e, "Warp lists corrupt, using defaults");
            WarpLists::default()
        })
    }

    /// Persist the document. Failures are logged and returned, never retried.
    pub fn save(&self, lists: &WarpLists) -> Result<(), StoreError> {
        let result = lists
            .to_pretty_json()
            .and_then(|bytes| self.storage.write(&bytes));
        if let Err(e) = &result {
            error!(location = %self.storage.location(), error = %e, "Failed to save warp lists");
        }
        result
    }

    pub fn add(&self, entity: Entity, player: &str) -> Result<ListChange, StoreError> {
        let mut lists = self.load();
        if !lists.get_mut(entity).add(player) {
            return Ok(ListChange::AlreadyPresent);
        }
        self.save(&lists)?;
        info!(entity = %entity, player = %player, "Added player to warp list");
        Ok(ListChange::Added)
    }

    pub fn remove(&self, entity: Entity, player: &str) -> Result<ListChange, StoreError> {
        let mut lists = self.load();
        if !lists.get_mut(entity).remove(player) {
            return Ok(ListChange::NotFound);
        }
        self.save(&lists)?;
        info!(entity = %entity, player = %player, "Removed player from warp list");
        Ok(ListChange::Removed)
    }

    /// Flip a list's enabled flag. Returns the new value.
    pub fn toggle(&self, entity: Entity) -> Result<bool, StoreError> {
        let mut lists = self.load();
        let list = lists.get_mut(entity);
        list.enabled = !list.enabled;
        let enabled = list.enabled;
        self.save(&lists)?;
        info!(entity = %entity, enabled, "Toggled warp list");
        Ok(enabled)
    }

    /// Players to party with for `entity`, if its list is enabled and non-empty
    pub fn party_members(&self, entity: Entity) -> Option<Vec<String>> {
        self.load().get(entity).party_members().map(<[String]>::to_vec)
    }
}
