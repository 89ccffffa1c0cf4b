//! Foresight Error Types
//!
//! Only configuration misuse is an error here. Transient conditions such as a
//! missing pointer, an unmounted target or a headless render pass degrade to
//! an empty candidate set instead.

use thiserror::Error;

/// Result type for foresight operations
pub type Result<T> = std::result::Result<T, ForesightError>;

/// Foresight error types
#[derive(Error, Debug)]
pub enum ForesightError {
    /// A prefetch key was registered twice
    #[error("Prefetch key already registered: {0}")]
    DuplicateKey(String),

    /// Radius must be a finite, positive number
    #[error("Invalid radius: {0} (must be finite and > 0)")]
    InvalidRadius(f64),

    /// Debounce interval must be non-zero
    #[error("Invalid debounce interval: must be > 0ms")]
    InvalidDebounce,

    /// Prefetch callback returned an error
    #[error("Prefetch callback for '{key}' failed: {source}")]
    Callback {
        /// Key whose callback failed
        key: String,
        /// Underlying callback error
        #[source]
        source: anyhow::Error,
    },
}

impl ForesightError {
    /// Check if this error came from a host callback rather than misuse
    pub fn is_callback_failure(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }
}
