//! # Error Types
//!
//! Lookups that miss (unknown timer id, unknown callback, entity that was
//! never queued) are not errors; they return `false` or `0`. What remains
//! here is caller input that cannot be honoured and configuration that
//! cannot be loaded.

use thiserror::Error;

/// Errors that can occur in the scheduling and pooling subsystem.
#[derive(Error, Debug)]
pub enum StagehandError {
    /// A timer was registered with an interval that is zero, negative,
    /// infinite or NaN.
    #[error("invalid timer interval: {0} (must be finite and > 0)")]
    InvalidInterval(f32),

    /// A configuration value is out of range.
    #[error("invalid configuration: {field}: {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The configuration file is not valid TOML for the expected schema.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),
}

/// Result type for stagehand operations.
pub type StagehandResult<T> = Result<T, StagehandError>;
