//! # rr-config
//!
//! Layered configuration for the engine binary.
//!
//! Sources, lowest priority first:
//! 1. built-in defaults
//! 2. `config/rusty-reddit.toml`, or the file named by `RUSTY_REDDIT_CONFIG`
//! 3. environment variables such as `RUSTY_REDDIT__ENGINE__MAILBOX_CAPACITY=64`
//!
//! A `.env` file in the working directory is loaded before the environment is read.

use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "RUSTY_REDDIT";
pub const CONFIG_PATH_VAR: &str = "RUSTY_REDDIT_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "config/rusty-reddit";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineSection,
    pub feed: FeedSection,
    pub listen: ListenSection,
    pub metrics: MetricsSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineSection {
    /// Name the engine endpoint is registered under.
    pub name: String,
    /// Requests that may queue in the mailbox before senders wait.
    pub mailbox_capacity: usize,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            name: "engine".into(),
            mailbox_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedSection {
    /// Lower bound on post age when ranking, so fresh posts don't divide by ~0.
    pub score_floor_hours: f64,
    /// Applied when a feed request carries no limit. `None` returns everything.
    pub default_limit: Option<usize>,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            score_floor_hours: 2.0,
            default_limit: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListenSection {
    pub addr: String,
}

impl Default for ListenSection {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8090".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsSection {
    pub enabled: bool,
    pub addr: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: "127.0.0.1:2112".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSection {
    pub format: LogFormat,
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".into(),
        }
    }
}

impl AppConfig {
    /// Loads `.env`, then the config file and environment on top of defaults.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());
        Self::load_from(&path)
    }

    /// Same as [`AppConfig::load`] without the `.env` step, reading `path`
    /// (extension optional) if it exists.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");

        let cfg: AppConfig = Config::builder()
            .add_source(File::with_name(&path.to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.name.trim().is_empty() {
            return Err(ConfigError::Invalid("engine.name must not be empty".into()));
        }
        if self.engine.mailbox_capacity == 0 {
            return Err(ConfigError::Invalid("engine.mailbox_capacity must be at least 1".into()));
        }
        let floor = self.feed.score_floor_hours;
        if floor.is_nan() || floor <= 0.0 {
            return Err(ConfigError::Invalid("feed.score_floor_hours must be positive".into()));
        }
        Ok(())
    }
}
