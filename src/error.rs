//! Error types for the airqual pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AirqualError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum AirqualError {
    /// The input file is missing or unreadable. The pipeline refuses to run
    /// on partial or absent data.
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Required column missing: {0}")]
    MissingColumn(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Search failed with params {params}: {reason}")]
    SearchError { params: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for AirqualError {
    fn from(err: polars::error::PolarsError) -> Self {
        AirqualError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for AirqualError {
    fn from(err: serde_json::Error) -> Self {
        AirqualError::SerializationError(err.to_string())
    }
}
