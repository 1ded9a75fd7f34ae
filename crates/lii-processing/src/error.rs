//! Error types for processing chains, plugins and sessions.

use lii_materials::MaterialError;
use lii_signal::{SignalError, SignalType};
use lii_temperature::FitError;
use thiserror::Error;

/// How loudly an error should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

pub type ProcessingResult<T> = Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    /// Parameter list does not match the plugin's schema.
    #[error("Parameter schema mismatch: {what}")]
    SchemaMismatch { what: String },

    #[error("Invalid value for parameter '{identifier}': {what}")]
    InvalidParameter { identifier: String, what: String },

    #[error("Plugin '{name}' is not available for {signal_type} signals")]
    UnknownPlugin { name: String, signal_type: SignalType },

    #[error("Invalid channel {channel}: {what}")]
    InvalidChannel { what: &'static str, channel: u32 },

    #[error("No plugin with uid {uid}")]
    PluginNotFound { uid: u64 },

    #[error("Run index {index} out of range")]
    RunNotFound { index: usize },

    /// Structural change requested while the run is being processed.
    #[error("Rejected while run is busy: {what}")]
    Busy { what: &'static str },

    #[error("Calculation failed: {what}")]
    Calculation { what: String },

    #[error("Chain configuration error: {what}")]
    Persistence { what: String },

    #[error("Processing cancelled")]
    Cancelled,

    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("Temperature error: {0}")]
    Fit(#[from] FitError),

    #[error("Material error: {0}")]
    Material(#[from] MaterialError),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessingError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Cancelled => Severity::Info,
            Self::Busy { .. } | Self::Calculation { .. } | Self::Fit(_) => Severity::Warning,
            Self::Io(_) => Severity::Critical,
            _ => Severity::Error,
        }
    }

    pub(crate) fn invalid_parameter(identifier: &str, what: impl Into<String>) -> Self {
        Self::InvalidParameter {
            identifier: identifier.to_string(),
            what: what.into(),
        }
    }
}
