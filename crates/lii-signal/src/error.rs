//! Error types for signal containers and instrument settings.

use lii_core::LiiError;
use thiserror::Error;

/// Result type for signal operations.
pub type SignalResult<T> = Result<T, SignalError>;

#[derive(Error, Debug)]
pub enum SignalError {
    /// Channel ID outside the valid range of the measurement point.
    #[error("Invalid channel {channel} for {what} (channels: {count})")]
    InvalidChannel {
        what: &'static str,
        channel: u32,
        count: usize,
    },

    /// Measurement point index outside the run.
    #[error("Measurement point {index} out of range (size {len})")]
    MPointOutOfRange { index: usize, len: usize },

    /// Instrument settings failed validation.
    #[error("Invalid LII settings: {what}")]
    InvalidSettings { what: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Core error: {0}")]
    Core(#[from] LiiError),
}
