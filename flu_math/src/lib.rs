//! # Flu Math
//!
//! Statistical helpers shared by the incidence forecaster: central tendency,
//! dispersion, error metrics, prediction summaries and the small linear
//! solver behind the ridge regressor.
//! Everything here works on plain `f64` slices and is built on `statrs`.

use thiserror::Error;

pub mod linalg;
pub mod metrics;
pub mod stats;

pub use linalg::solve_symmetric;
pub use metrics::{rmse, Summary};
pub use stats::{max, mean, median, min, sample_std};

/// Errors that can occur in statistical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for statistical operations
pub type Result<T> = std::result::Result<T, MathError>;
