use anyhow::Result;

pub mod config;
pub mod lists;
pub mod run;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
