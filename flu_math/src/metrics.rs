//! Error metrics and prediction summaries

use crate::stats;
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root mean squared error between observed and predicted values
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    if actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(format!(
            "Actual length ({}) doesn't match predicted length ({})",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.is_empty() {
        return Err(MathError::InsufficientData(
            "RMSE needs at least one value".to_string(),
        ));
    }

    let mse = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;

    Ok(mse.sqrt())
}

/// Location and range of a set of predicted values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Summarise a non-empty slice
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let insufficient = || MathError::InsufficientData("Cannot summarise an empty set".to_string());

        Ok(Self {
            count: values.len(),
            mean: stats::mean(values).ok_or_else(insufficient)?,
            median: stats::median(values).ok_or_else(insufficient)?,
            min: stats::min(values).ok_or_else(insufficient)?,
            max: stats::max(values).ok_or_else(insufficient)?,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Prediction summary ({} values):", self.count)?;
        writeln!(f, "   Mean:   {:.2}", self.mean)?;
        writeln!(f, "   Median: {:.2}", self.median)?;
        writeln!(f, "   Min:    {:.2}", self.min)?;
        write!(f, "   Max:    {:.2}", self.max)
    }
}
