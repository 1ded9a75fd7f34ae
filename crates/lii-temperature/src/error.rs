//! Error types for temperature calculations.

use lii_materials::MaterialError;
use lii_models::ModelError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Channel mismatch: {what}")]
    ChannelMismatch { what: String },

    #[error("No usable channel data")]
    NoActiveChannels,

    #[error("Fit diverged after {iterations} iterations")]
    Diverged { iterations: usize },

    #[error("Two-color ratio has no physical solution: {what}")]
    NoSolution { what: &'static str },

    #[error("Material error: {0}")]
    Material(#[from] MaterialError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type FitResult<T> = Result<T, FitError>;
