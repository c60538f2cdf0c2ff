use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "endbrood.toml";

/// Main configuration structure for EndBrood
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndBroodConfig {
    /// Poll, party and cycle timings
    pub timings: TimingConfig,
    /// Warp list persistence
    pub storage: StorageConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

/// All durations are in milliseconds so the file and env overrides stay plain integers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Boss state poll period
    pub poll_interval_ms: u64,
    /// Party creation to `p warp`
    pub warp_delay_ms: u64,
    /// `p warp` to `p disband`
    pub disband_delay_ms: u64,
    /// Period between location cycle ticks
    pub cycle_period_ms: u64,
    /// Guard window after a location warp
    pub warp_cooldown_ms: u64,
    /// Delay before cycling resumes after the Protector dies
    pub resume_delay_ms: u64,
    /// Longest time to hold position for an imminent Broodmother. Unset holds
    /// until the state leaves Imminent; once set, a hold that runs out resumes
    /// cycling and can miss the spawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brood_hold_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Path of the warp lists JSON document
    pub warp_lists_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Default filter when RUST_LOG is unset
    pub log_level: String,
    /// Emit structured JSON logs instead of the compact format
    pub json_logs: bool,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            warp_delay_ms: 5000,
            disband_delay_ms: 5000,
            cycle_period_ms: 5000,
            warp_cooldown_ms: 4000,
            resume_delay_ms: 5000,
            brood_hold_timeout_ms: None,
        }
    }
}

impl Default for EndBroodConfig {
    fn default() -> Self {
        Self {
            timings: TimingConfig::default(),
            storage: StorageConfig {
                warp_lists_path: PathBuf::from(
                    "./config/ChatTriggers/modules/EndBrood/warp_lists.json",
                ),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: false,
            },
        }
    }
}

/// Resolved timer durations handed to the core components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub poll_interval: Duration,
    pub warp_delay: Duration,
    pub disband_delay: Duration,
    pub cycle_period: Duration,
    pub warp_cooldown: Duration,
    pub resume_delay: Duration,
    pub brood_hold_timeout: Option<Duration>,
}

impl From<&TimingConfig> for Timings {
    fn from(config: &TimingConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            warp_delay: Duration::from_millis(config.warp_delay_ms),
            disband_delay: Duration::from_millis(config.disband_delay_ms),
            cycle_period: Duration::from_millis(config.cycle_period_ms),
            warp_cooldown: Duration::from_millis(config.warp_cooldown_ms),
            resume_delay: Duration::from_millis(config.resume_delay_ms),
            brood_hold_timeout: config.brood_hold_timeout_ms.map(Duration::from_millis),
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl EndBroodConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (`endbrood.toml` or the explicit path)
    /// 3. Environment variables (prefixed with ENDBROOD__, sections split by `__`)
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()));
            }
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE));
            }
            None => {}
        }

        builder = builder.add_source(
            Environment::with_prefix("ENDBROOD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }

    pub fn timings(&self) -> Timings {
        Timings::from(&self.timings)
    }
}
