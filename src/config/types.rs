//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::debounce::DEFAULT_DEBOUNCE_MS;
use crate::error::{ForesightError, Result};
use crate::predictor::{validate_radius, GeometryAccess, DEFAULT_RADIUS};

/// Which candidates of a debounced emission get prefetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Only the nearest not-yet-fetched candidate per emission
    Single,

    /// Every not-yet-fetched candidate, in tracking order
    #[default]
    Multiple,
}

impl TriggerMode {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Single => "Prefetch the nearest candidate per emission",
            Self::Multiple => "Prefetch every candidate per emission",
        }
    }
}

impl std::fmt::Display for TriggerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Multiple => write!(f, "multiple"),
        }
    }
}

impl std::str::FromStr for TriggerMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "nearest" => Ok(Self::Single),
            "multiple" | "all" => Ok(Self::Multiple),
            _ => Err(format!("Unknown trigger mode: {}", s)),
        }
    }
}

/// Predictive prefetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForesightConfig {
    /// Trigger radius, also drives look-ahead (`radius / 100`)
    #[serde(default = "default_radius")]
    pub radius: f64,

    /// Quiet interval before a candidate set is acted on (ms)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Which candidates to prefetch per emission
    #[serde(default)]
    pub mode: TriggerMode,

    /// Whether element geometry can be queried in this context
    #[serde(default)]
    pub geometry: GeometryAccess,
}

fn default_radius() -> f64 {
    DEFAULT_RADIUS
}
fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

impl Default for ForesightConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            debounce_ms: default_debounce_ms(),
            mode: TriggerMode::default(),
            geometry: GeometryAccess::default(),
        }
    }
}

impl ForesightConfig {
    /// Config with a specific radius and defaults elsewhere
    pub fn with_radius(radius: f64) -> Self {
        Self {
            radius,
            ..Self::default()
        }
    }

    /// Quiet interval as a duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Check radius and debounce interval
    pub fn validate(&self) -> Result<()> {
        validate_radius(self.radius)?;
        if self.debounce_ms == 0 {
            return Err(ForesightError::InvalidDebounce);
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Also write logs to this file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}
