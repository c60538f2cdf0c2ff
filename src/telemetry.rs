use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// Logs always go to stderr: stdout carries the session feed.
pub fn init_telemetry(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    tracing::info!("EndBrood telemetry initialized");
    Ok(())
}

/// Generate a correlation ID linking the log lines of one party run
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Span wrapping every log line of one party run
pub fn create_run_span(run_id: &str, participants: usize) -> tracing::Span {
    tracing::info_span!(
        "party_run",
        run.id = run_id,
        run.participants = participants,
    )
}
