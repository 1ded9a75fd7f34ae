//! Material and gas property errors.

use lii_core::LiiError;
use thiserror::Error;

/// Result type for property lookups.
pub type MaterialResult<T> = Result<T, MaterialError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterialError {
    /// Property not defined for this material or gas.
    #[error("{owner} does not define {property}")]
    MissingProperty {
        owner: String,
        property: &'static str,
    },

    /// Property evaluated to a non-physical value.
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

impl From<MaterialError> for LiiError {
    fn from(err: MaterialError) -> Self {
        match err {
            MaterialError::MissingProperty { property, .. } => LiiError::InvalidArg { what: property },
            MaterialError::NonPhysical { what, value } => LiiError::NonPhysical { what, value },
            MaterialError::InvalidArg { what } => LiiError::InvalidArg { what },
        }
    }
}
