//! Missing-value policy
//!
//! A single rule decides what stands in for an unknown value wherever one
//! shows up: a region seeded with a single observation, a rolling statistic
//! with no history for its (region, week number), a training row without a
//! previous week, and a forecast row for a region the lag state has never
//! seen. Keeping those sites on one policy keeps training and forecasting
//! consistent.

use serde::{Deserialize, Serialize};

/// How unknown values are replaced
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Median of the known values, or 0 when nothing is known
    #[default]
    Median,
    /// Always 0
    Zero,
    /// A fixed value
    Constant(f64),
}

impl MissingValuePolicy {
    /// The replacement value given the values known at this site
    pub fn fill_value(&self, known: &[f64]) -> f64 {
        match self {
            MissingValuePolicy::Median => flu_math::median(known).unwrap_or(0.0),
            MissingValuePolicy::Zero => 0.0,
            MissingValuePolicy::Constant(value) => *value,
        }
    }

    /// Fill the gaps of a column from its own present values
    pub fn fill_column(&self, column: &[Option<f64>]) -> Vec<f64> {
        let known: Vec<f64> = column.iter().flatten().copied().collect();
        let replacement = self.fill_value(&known);

        column
            .iter()
            .map(|value| value.unwrap_or(replacement))
            .collect()
    }
}
