use anyhow::Result;
use tokio::io::BufReader;
use tracing::info;

use super::Command;
use crate::config::EndBroodConfig;
use crate::feed::FeedWriter;
use crate::runtime::{self, Session};

pub struct RunCommand {
    config: EndBroodConfig,
}

impl RunCommand {
    pub fn new(config: EndBroodConfig) -> Self {
        Self { config }
    }
}

impl Command for RunCommand {
    async fn execute(&self) -> Result<()> {
        info!(
            warp_lists = %self.config.storage.warp_lists_path.display(),
            "Starting live session"
        );

        let sink = FeedWriter::new(std::io::stdout());
        let mut session = Session::new(&self.config, Box::new(sink));
        let input = BufReader::new(tokio::io::stdin());

        runtime::run(&mut session, input, runtime::ctrl_c()).await?;

        info!("Session ended");
        Ok(())
    }
}
