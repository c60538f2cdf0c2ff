use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "endbrood")]
#[command(about = "Boss tracker and party warp automation for the End")]
#[command(long_about = "EndBrood watches Broodmother and Endstone Protector states reported by a game \
                       client bridge, cycles between warp locations, and parties the players on your \
                       warp lists when a boss spawns. Start a live session with 'endbrood run'.")]
pub struct Cli {
    /// Configuration file (defaults to ./endbrood.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a live session, reading feed frames on stdin and writing commands to stdout
    Run,
    /// Manage the warp lists without a live session
    Lists {
        #[command(subcommand)]
        action: ListsAction,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ListsAction {
    /// Show both warp lists
    Show,
    /// Add a player to a warp list
    Add {
        #[arg(help = "List to change: brood or prot")]
        entity: String,
        player: String,
    },
    /// Remove a player from a warp list
    Remove {
        #[arg(help = "List to change: brood or prot")]
        entity: String,
        player: String,
    },
    /// Enable or disable a warp list
    Toggle {
        #[arg(help = "List to change: brood or prot")]
        entity: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing configuration file
        #[arg(long, help = "Overwrite the configuration file if it already exists")]
        force: bool,
    },
}
