use anyhow::Result;

use super::Command;
use crate::cli::ListsAction;
use crate::console::{self, OperatorCommand};
use crate::warp_list::WarpListStore;

/// Offline warp list management. Prints the same feedback as the in-game commands.
pub struct ListsCommand {
    store: WarpListStore,
    command: OperatorCommand,
}

impl ListsCommand {
    pub fn new(store: WarpListStore, action: &ListsAction) -> Self {
        let command = match action {
            ListsAction::Show => OperatorCommand::WarpList,
            ListsAction::Add { entity, player } => OperatorCommand::WarpAdd {
                entity: entity.clone(),
                player: player.clone(),
            },
            ListsAction::Remove { entity, player } => OperatorCommand::WarpRemove {
                entity: entity.clone(),
                player: player.clone(),
            },
            ListsAction::Toggle { entity } => OperatorCommand::WarpToggle {
                entity: entity.clone(),
            },
        };
        Self { store, command }
    }
}

impl Command for ListsCommand {
    async fn execute(&self) -> Result<()> {
        for line in console::run_list_command(&self.store, &self.command) {
            println!("{line}");
        }
        Ok(())
    }
}
