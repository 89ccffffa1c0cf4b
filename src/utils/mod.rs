//! Utility Functions
//!
//! User-friendly error formatting for the `foresight-replay` binary.
//!
//! ```rust
//! use foresight::utils::format_user_error;
//!
//! let err = anyhow::anyhow!("Failed to parse scenario file");
//! eprintln!("{}", format_user_error(&err));
//! ```
//!
//! Error categories with context-aware help:
//! - Config errors → TOML syntax, radius and debounce ranges
//! - Scenario errors → JSON layout of targets and samples
//! - Duplicate registrations → unique prefetch keys

pub mod errors;

pub use errors::format_user_error;
