//! Error types for heat transfer evaluation and cooling simulations.

use lii_core::LiiError;
use lii_materials::MaterialError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: &'static str },

    #[error("Model '{model}' is missing properties: {}", missing.join(", "))]
    MissingProperties { model: String, missing: Vec<String> },

    #[error("Material error: {0}")]
    Material(#[from] MaterialError),

    #[error("{0}")]
    Core(#[from] LiiError),
}

pub type ModelResult<T> = Result<T, ModelError>;
