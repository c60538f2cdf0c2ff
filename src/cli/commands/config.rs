use anyhow::{anyhow, Result};
use std::path::PathBuf;

use super::Command;
use crate::config::EndBroodConfig;

/// Writes the built-in defaults, never the layered configuration
pub struct ConfigInitCommand {
    path: PathBuf,
    force: bool,
}

impl ConfigInitCommand {
    pub fn new(path: PathBuf, force: bool) -> Self {
        Self { path, force }
    }
}

impl Command for ConfigInitCommand {
    async fn execute(&self) -> Result<()> {
        if self.path.exists() && !self.force {
            return Err(anyhow!(
                "{} already exists. Use --force to overwrite it",
                self.path.display()
            ));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        EndBroodConfig::default().save_to_file(&self.path)?;
        println!("Wrote default configuration to {}", self.path.display());
        Ok(())
    }
}
