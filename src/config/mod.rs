//! Configuration management
//!
//! Handles loading and validation of configuration from:
//! - TOML files
//! - CLI overrides

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod types;

pub use types::{ForesightConfig, LoggingConfig, TriggerMode};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Prediction and prefetch configuration
    #[serde(default)]
    pub foresight: ForesightConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&content)?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.foresight
            .validate()
            .context("Invalid [foresight] config")?;

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        Ok(())
    }

    /// Apply CLI overrides
    pub fn with_overrides(mut self, radius: Option<f64>, debounce_ms: Option<u64>) -> Self {
        if let Some(radius) = radius {
            self.foresight.radius = radius;
        }
        if let Some(debounce_ms) = debounce_ms {
            self.foresight.debounce_ms = debounce_ms;
        }

        self
    }
}
