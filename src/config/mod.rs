pub mod broker_config;
pub mod server_config;

pub use broker_config::BrokerConfig;
pub use server_config::ServerConfig;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure matching config.yaml format
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub broker: BrokerConfig,
}

impl Config {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config =
            serde_yaml::from_str(&content).with_context(|| "Failed to parse YAML config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, otherwise fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.broker.capacity == 0 {
            anyhow::bail!("broker.capacity must be greater than zero");
        }
        if self.broker.enqueue_timeout_secs == 0 {
            anyhow::bail!("broker.enqueue_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}
