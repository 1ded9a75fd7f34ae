use lii_models::ModelError;
use lii_processing::ProcessingError;
use lii_signal::SignalError;
use lii_temperature::FitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("Temperature error: {0}")]
    Fit(#[from] FitError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CliResult<T> = Result<T, CliError>;
