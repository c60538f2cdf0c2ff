use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use endbrood::cli::commands::config::ConfigInitCommand;
use endbrood::cli::commands::lists::ListsCommand;
use endbrood::cli::commands::run::RunCommand;
use endbrood::cli::commands::Command;
use endbrood::cli::{Cli, Commands, ConfigAction};
use endbrood::config::DEFAULT_CONFIG_FILE;
use endbrood::{init_telemetry, EndBroodConfig, WarpListStore};

fn main() -> Result<()> {
    let cli = Cli::parse();

    EndBroodConfig::load_env_file()?;
    let load_config = || EndBroodConfig::load(cli.config.as_deref());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Run => {
            let config = load_config()?;
            init_telemetry(&config.observability)?;
            runtime.block_on(RunCommand::new(config).execute())
        }
        Commands::Lists { action } => {
            let config = load_config()?;
            let store = WarpListStore::open(config.storage.warp_lists_path.clone());
            runtime.block_on(ListsCommand::new(store, &action).execute())
        }
        Commands::Config {
            action: ConfigAction::Init { force },
        } => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            runtime.block_on(ConfigInitCommand::new(path, force).execute())
        }
    }
}
