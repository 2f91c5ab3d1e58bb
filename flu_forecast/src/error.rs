//! Error types for the flu_forecast crate

use crate::data::{Region, Week};
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the flu_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A required input column is absent from a loaded table
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The regressor expects a feature the transform does not produce
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    /// A feature or lag turned out NaN or infinite
    #[error("Non-finite value {value} for '{feature}' in week {week}, region {region}")]
    NonFiniteValue {
        week: Week,
        region: Region,
        feature: String,
        value: f64,
    },

    /// The prediction call failed; the whole run is aborted
    #[error("Regressor failed on week {week}: {message}")]
    RegressorFailure { week: Week, message: String },

    /// Two horizon rows share an identifier, or a region repeats within a week
    #[error("Duplicate row: {0}")]
    DuplicateRow(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error while writing CSV output
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error while reading or writing JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from the statistics helpers
    #[error("Math error: {0}")]
    MathError(#[from] flu_math::MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
