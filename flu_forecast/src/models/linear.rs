//! Ridge-regularised linear model with per-region offsets

use super::Regressor;
use crate::data::Region;
use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Smallest ridge penalty [`LinearRegressor::fit`] accepts.
///
/// `taux_diff1` is `taux_lag1 - taux_lag2`, so the unpenalised normal
/// equations of either feature set are singular.
pub const MIN_RIDGE: f64 = 1e-6;

/// `intercept + sum(coef_i * x_i) + offset(region)`
///
/// The region offset encodes the categorical region code; regions unseen at
/// fit time get no offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    feature_names: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
    #[serde(default)]
    region_offsets: BTreeMap<Region, f64>,
}

impl LinearRegressor {
    /// Create a model from known coefficients
    pub fn new(feature_names: Vec<String>, coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        if feature_names.len() != coefficients.len() {
            return Err(ForecastError::InvalidParameter(format!(
                "{} feature names but {} coefficients",
                feature_names.len(),
                coefficients.len()
            )));
        }

        Ok(Self {
            feature_names,
            coefficients,
            intercept,
            region_offsets: BTreeMap::new(),
        })
    }

    pub fn with_region_offset(mut self, region: Region, offset: f64) -> Self {
        self.region_offsets.insert(region, offset);
        self
    }

    /// Fit by ridge regression on centred data; `ridge` penalises the
    /// coefficients but not the intercept. Region offsets are the mean
    /// residual of each region.
    pub fn fit(features: &FeatureMatrix, targets: &[f64], ridge: f64) -> Result<Self> {
        if features.len() != targets.len() {
            return Err(ForecastError::DataError(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        if features.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot fit a model on an empty training set".to_string(),
            ));
        }
        check_ridge(ridge)?;

        let n = features.len() as f64;
        let k = features.columns().len();
        let rows = features.rows();

        let y_mean = targets.iter().sum::<f64>() / n;
        let mut x_mean = vec![0.0; k];
        for row in rows {
            for (mean, value) in x_mean.iter_mut().zip(row.values.iter()) {
                *mean += value / n;
            }
        }

        // (Xc'Xc + ridge * I) beta = Xc'yc
        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        for (row, &y) in rows.iter().zip(targets.iter()) {
            let centred: Vec<f64> = row
                .values
                .iter()
                .zip(x_mean.iter())
                .map(|(x, mean)| x - mean)
                .collect();
            for i in 0..k {
                xty[i] += centred[i] * (y - y_mean);
                for j in 0..k {
                    xtx[i][j] += centred[i] * centred[j];
                }
            }
        }
        for (i, row) in xtx.iter_mut().enumerate() {
            row[i] += ridge;
        }

        let coefficients = if k == 0 {
            Vec::new()
        } else {
            flu_math::solve_symmetric(&xtx, &xty)?
        };
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(x_mean.iter())
                .map(|(beta, mean)| beta * mean)
                .sum::<f64>();

        let mut model = Self {
            feature_names: features.columns().to_vec(),
            coefficients,
            intercept,
            region_offsets: BTreeMap::new(),
        };

        let mut residuals: BTreeMap<&Region, (f64, usize)> = BTreeMap::new();
        for (row, &y) in rows.iter().zip(targets.iter()) {
            let entry = residuals.entry(&row.region).or_insert((0.0, 0));
            entry.0 += y - model.linear_term(&row.values);
            entry.1 += 1;
        }
        model.region_offsets = residuals
            .into_iter()
            .map(|(region, (sum, count))| (region.clone(), sum / count as f64))
            .collect();

        Ok(model)
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Feature names with their coefficients, largest magnitude first
    pub fn importance(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .feature_names
            .iter()
            .map(String::as_str)
            .zip(self.coefficients.iter().copied())
            .collect();
        ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        ranked
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn region_offset(&self, region: &Region) -> Option<f64> {
        self.region_offsets.get(region).copied()
    }

    /// Load a model saved with [`LinearRegressor::to_json_file`]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let model: Self = serde_json::from_reader(reader)?;

        if model.feature_names.len() != model.coefficients.len() {
            return Err(ForecastError::DataError(format!(
                "Model file has {} feature names but {} coefficients",
                model.feature_names.len(),
                model.coefficients.len()
            )));
        }
        Ok(model)
    }

    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    fn linear_term(&self, values: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(values.iter())
                .map(|(beta, x)| beta * x)
                .sum::<f64>()
    }
}

/// Reject penalties below [`MIN_RIDGE`]
pub fn check_ridge(ridge: f64) -> Result<()> {
    if !ridge.is_finite() || ridge < MIN_RIDGE {
        return Err(ForecastError::InvalidParameter(format!(
            "Ridge penalty must be at least {}, got {}: taux_diff1 is collinear with \
             taux_lag1 and taux_lag2, so the unpenalised fit is singular",
            MIN_RIDGE, ridge
        )));
    }
    Ok(())
}

impl Regressor for LinearRegressor {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        let projected;
        let features = if features.columns() == self.feature_names.as_slice() {
            features
        } else {
            projected = features.select(&self.feature_names)?;
            &projected
        };

        Ok(features
            .rows()
            .iter()
            .map(|row| {
                self.linear_term(&row.values) + self.region_offset(&row.region).unwrap_or(0.0)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Week;
    use crate::features::FeatureRow;
    use approx::assert_relative_eq;
    use tempfile::NamedTempFile;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn linear_data() -> (FeatureMatrix, Vec<f64>) {
        let week = Week::new(2015, 10).unwrap();
        let mut matrix = FeatureMatrix::new(names(&["x1", "x2"]));
        let mut targets = Vec::new();
        for i in 0..20 {
            let x1 = i as f64;
            let x2 = ((i * 7) % 5) as f64;
            let region = if i % 2 == 0 { "A" } else { "B" };
            matrix
                .push(FeatureRow::new(Region::new(region), week, vec![x1, x2]))
                .unwrap();
            targets.push(1.0 + 2.0 * x1 - x2);
        }
        (matrix, targets)
    }

    #[test]
    fn test_fit_recovers_linear_relation() {
        let (matrix, targets) = linear_data();
        let model = LinearRegressor::fit(&matrix, &targets, MIN_RIDGE).unwrap();

        assert_relative_eq!(model.coefficients()[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(model.coefficients()[1], -1.0, epsilon = 1e-6);
        assert_relative_eq!(model.intercept(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(model.region_offset(&Region::new("A")).unwrap(), 0.0, epsilon = 1e-6);

        let predictions = model.predict(&matrix).unwrap();
        for (p, y) in predictions.iter().zip(targets.iter()) {
            assert_relative_eq!(*p, *y, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_fit_learns_region_offsets() {
        let week = Week::new(2015, 10).unwrap();
        let mut matrix = FeatureMatrix::new(names(&["x"]));
        let mut targets = Vec::new();
        for i in 0..10 {
            let x = i as f64;
            matrix
                .push(FeatureRow::new(Region::new("A"), week, vec![x]))
                .unwrap();
            targets.push(x + 5.0);
            matrix
                .push(FeatureRow::new(Region::new("B"), week, vec![x]))
                .unwrap();
            targets.push(x - 5.0);
        }

        let model = LinearRegressor::fit(&matrix, &targets, MIN_RIDGE).unwrap();
        assert_relative_eq!(model.region_offset(&Region::new("A")).unwrap(), 5.0, epsilon = 1e-6);
        assert_relative_eq!(model.region_offset(&Region::new("B")).unwrap(), -5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let (matrix, targets) = linear_data();
        assert!(LinearRegressor::fit(&matrix, &targets[1..], 1.0).is_err());
        assert!(LinearRegressor::fit(&matrix, &targets, -1.0).is_err());
        assert!(matches!(
            LinearRegressor::fit(&matrix, &targets, 0.0),
            Err(ForecastError::InvalidParameter(message)) if message.contains("collinear")
        ));
        assert!(LinearRegressor::fit(&FeatureMatrix::new(names(&["x1"])), &[], 1.0).is_err());
    }

    #[test]
    fn test_predict_projects_columns() {
        let model = LinearRegressor::new(names(&["b", "a"]), vec![10.0, 1.0], 0.5)
            .unwrap()
            .with_region_offset(Region::new("A"), 100.0);

        let week = Week::new(2015, 10).unwrap();
        let matrix = FeatureMatrix::from_rows(
            names(&["a", "b", "unused"]),
            vec![
                FeatureRow::new(Region::new("A"), week, vec![1.0, 2.0, 99.0]),
                FeatureRow::new(Region::new("C"), week, vec![3.0, 0.0, 99.0]),
            ],
        )
        .unwrap();

        let predictions = model.predict(&matrix).unwrap();
        assert_relative_eq!(predictions[0], 0.5 + 20.0 + 1.0 + 100.0);
        assert_relative_eq!(predictions[1], 0.5 + 3.0);
    }

    #[test]
    fn test_json_round_trip() {
        let model = LinearRegressor::new(names(&["x"]), vec![2.0], 1.0)
            .unwrap()
            .with_region_offset(Region::new("11"), -0.5);

        let file = NamedTempFile::new().unwrap();
        model.to_json_file(file.path()).unwrap();
        let loaded = LinearRegressor::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_importance_sorted_by_magnitude() {
        let model =
            LinearRegressor::new(names(&["a", "b", "c"]), vec![0.5, -3.0, 1.25], 0.0).unwrap();

        assert_eq!(
            model.importance(),
            vec![("b", -3.0), ("c", 1.25), ("a", 0.5)]
        );
    }

    #[test]
    fn test_coefficient_count_must_match() {
        assert!(LinearRegressor::new(names(&["x", "y"]), vec![1.0], 0.0).is_err());
    }
}
