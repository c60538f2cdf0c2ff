//! Operator console
//!
//! Slash commands typed by the player. Each command line is parsed with clap in
//! multicall mode, so `/warpadd brood Steve` dispatches on `warpadd` directly.
//! Every outcome is rendered as feedback lines for the operator.

use clap::{Parser, Subcommand};

use crate::status::{Entity, EntityState};
use crate::warp_list::{ListChange, WarpListStore};

#[derive(Parser, Debug)]
#[command(multicall = true, disable_help_flag = true)]
struct OperatorLine {
    #[command(subcommand)]
    command: OperatorCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Toggle automatic boss cycling
    #[command(name = "cycle")]
    Cycle,
    /// Add player to warp list
    #[command(name = "warpadd")]
    WarpAdd { entity: String, player: String },
    /// Remove player from warp list
    #[command(name = "warpremove")]
    WarpRemove { entity: String, player: String },
    /// Show current warp lists
    #[command(name = "warplist")]
    WarpList,
    /// Toggle warp list on/off
    #[command(name = "warptoggle")]
    WarpToggle { entity: String },
    /// Show current boss states
    #[command(name = "checkboss")]
    CheckBoss,
    /// Show this help message
    #[command(name = "endbroodhelp")]
    Help,
}

const INVALID_TYPE: &str = "Invalid type. Use 'brood' or 'prot'";

const HELP: [(&str, &str); 7] = [
    ("/cycle", "Toggle automatic boss cycling"),
    ("/checkboss", "Show current boss states"),
    ("/warpadd <brood|prot> <player>", "Add player to warp list"),
    ("/warpremove <brood|prot> <player>", "Remove player from warp list"),
    ("/warplist", "Show current warp lists"),
    ("/warptoggle <brood|prot>", "Toggle warp list on/off"),
    ("/endbroodhelp", "Show this help message"),
];

/// Parse one command line. The error is the feedback to show instead.
pub fn parse_line(line: &str) -> Result<OperatorCommand, String> {
    let line = line.trim();
    let line = line.strip_prefix('/').unwrap_or(line);
    let words: Vec<&str> = line.split_whitespace().collect();

    let Some(name) = words.first().copied() else {
        return Err(unknown_command(""));
    };

    OperatorLine::try_parse_from(words.iter().copied())
        .map(|parsed| parsed.command)
        .map_err(|_| match usage(name) {
            Some(usage) => format!("Usage: {usage}"),
            None => unknown_command(name),
        })
}

fn usage(name: &str) -> Option<&'static str> {
    HELP.iter()
        .map(|(usage, _)| *usage)
        .find(|usage| usage[1..].split(' ').next() == Some(name))
}

fn unknown_command(name: &str) -> String {
    format!("Unknown command '/{name}'. Use /endbroodhelp")
}

pub fn help_lines() -> Vec<String> {
    let mut lines = vec!["=== EndBrood Commands ===".to_string()];
    lines.extend(
        HELP.iter()
            .map(|(usage, description)| format!("{usage} - {description}")),
    );
    lines
}

pub fn boss_report(broodmother: &EntityState, protector: &EntityState, cycling: bool) -> Vec<String> {
    let describe = |state: &EntityState| {
        state
            .value
            .as_ref()
            .map_or_else(|| "Unknown".to_string(), ToString::to_string)
    };
    vec![
        "Current boss states:".to_string(),
        format!("{}: {}", Entity::Broodmother, describe(broodmother)),
        format!("{}: {}", Entity::Protector, describe(protector)),
        format!("Cycling: {}", enabled_label(cycling)),
    ]
}

/// Execute a warp-list command against `store`.
///
/// Non-list commands produce no feedback here; the controller owns them.
pub fn run_list_command(store: &WarpListStore, command: &OperatorCommand) -> Vec<String> {
    match command {
        OperatorCommand::WarpAdd { entity, player } => with_entity(entity, |entity| {
            let key = entity.list_key();
            match store.add(entity, player) {
                Ok(ListChange::Added) => format!("Added {player} to {key} warp list"),
                Ok(_) => format!("Player {player} is already in the {key} warp list"),
                Err(e) => format!("Error saving warp lists: {e}"),
            }
        }),
        OperatorCommand::WarpRemove { entity, player } => with_entity(entity, |entity| {
            let key = entity.list_key();
            match store.remove(entity, player) {
                Ok(ListChange::Removed) => format!("Removed {player} from {key} warp list"),
                Ok(_) => format!("Player {player} is not in the {key} warp list"),
                Err(e) => format!("Error saving warp lists: {e}"),
            }
        }),
        OperatorCommand::WarpToggle { entity } => with_entity(entity, |entity| {
            match store.toggle(entity) {
                Ok(enabled) => format!(
                    "{} warp list {}",
                    entity.list_key(),
                    if enabled { "enabled" } else { "disabled" }
                ),
                Err(e) => format!("Error saving warp lists: {e}"),
            }
        }),
        OperatorCommand::WarpList => {
            let lists = store.load();
            let mut lines = vec!["Current warp lists:".to_string()];
            for entity in Entity::ALL {
                let list = lists.get(entity);
                let players = if list.players.is_empty() {
                    "Empty".to_string()
                } else {
                    list.players.join(", ")
                };
                lines.push(format!(
                    "{entity} ({}): {players}",
                    enabled_label(list.enabled)
                ));
            }
            lines
        }
        OperatorCommand::Cycle | OperatorCommand::CheckBoss | OperatorCommand::Help => Vec::new(),
    }
}

fn with_entity(arg: &str, f: impl FnOnce(Entity) -> String) -> Vec<String> {
    match Entity::parse(arg) {
        Ok(entity) => vec![f(entity)],
        Err(_) => vec![INVALID_TYPE.to_string()],
    }
}

fn enabled_label(enabled: bool) -> &'static str {
    if enabled {
        "Enabled"
    } else {
        "Disabled"
    }
}
