//! Feature engineering for the incidence regressor
//!
//! A transform works in two phases. [`FeatureTransform::prepare`] computes
//! everything that does not depend on lags (seasonality, rolling history,
//! search signal) once per row. [`FeatureTransform::assemble`] attaches a
//! lag pair and derives the lag interactions. Training and forecasting both
//! go through the same `assemble`, so the lag formulas exist exactly once.

use crate::data::{Covariates, Observation, Region, Week};
use crate::error::{ForecastError, Result};
use crate::lag_state::LagPair;
use serde::{Deserialize, Serialize};

pub mod rolling;
pub mod seasonal;

pub use rolling::{RollingStat, RollingStats};
pub use seasonal::{FeatureColumn, FeatureSet, FluSeason, SeasonalTransform, StaticFeatures};

/// Maps covariate rows plus a historical reference to feature vectors
pub trait FeatureTransform {
    /// Lag-independent part of a row, computed once
    type Prepared;

    /// Names of the produced features, in output order
    fn columns(&self) -> Vec<String>;

    /// Compute the lag-independent features of `rows`.
    ///
    /// Output is aligned with `rows`. `reference` feeds the rolling
    /// statistics and must not extend past the first row to be predicted.
    fn prepare<R: Covariates>(
        &self,
        rows: &[R],
        reference: &[Observation],
    ) -> Result<Vec<Self::Prepared>>;

    /// Attach `lags` and derive the lag-dependent features
    fn assemble(&self, prepared: &Self::Prepared, lags: LagPair) -> Result<FeatureRow>;
}

/// One row of a feature matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Categorical region code, carried next to the numeric values
    pub region: Region,
    pub week: Week,
    pub values: Vec<f64>,
}

impl FeatureRow {
    pub fn new(region: Region, week: Week, values: Vec<f64>) -> Self {
        Self {
            region,
            week,
            values,
        }
    }

    /// Fail on the first NaN or infinite value
    pub fn ensure_finite(&self, columns: &[String]) -> Result<()> {
        for (name, value) in columns.iter().zip(self.values.iter()) {
            if !value.is_finite() {
                return Err(ForecastError::NonFiniteValue {
                    week: self.week,
                    region: self.region.clone(),
                    feature: name.clone(),
                    value: *value,
                });
            }
        }
        Ok(())
    }
}

/// Named columns over a batch of rows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<FeatureRow>) -> Result<Self> {
        let mut matrix = Self::new(columns);
        for row in rows {
            matrix.push(row)?;
        }
        Ok(matrix)
    }

    /// Append a row; its width must match the columns
    pub fn push(&mut self, row: FeatureRow) -> Result<()> {
        if row.values.len() != self.columns.len() {
            return Err(ForecastError::DataError(format!(
                "Row has {} values but the matrix has {} columns",
                row.values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row.values[idx]).collect())
    }

    /// Reorder/project the columns to `names`
    pub fn select(&self, names: &[String]) -> Result<FeatureMatrix> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name)
                    .ok_or_else(|| ForecastError::MissingFeature(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        let rows = self
            .rows
            .iter()
            .map(|row| {
                FeatureRow::new(
                    row.region.clone(),
                    row.week,
                    indices.iter().map(|&idx| row.values[idx]).collect(),
                )
            })
            .collect();

        Ok(FeatureMatrix {
            columns: names.to_vec(),
            rows,
        })
    }

    /// Rows at `indices`, in that order
    pub fn subset(&self, indices: &[usize]) -> FeatureMatrix {
        FeatureMatrix {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}
