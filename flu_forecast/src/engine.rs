//! Recursive multi-step forecasting
//!
//! Future lag features are not observed, so each forecast week is fed by the
//! model's own clipped predictions for the weeks before it. Weeks are
//! processed strictly in chronological order; within a week the whole batch
//! goes to the regressor in one call and every region present is advanced
//! exactly once afterwards.

use crate::data::{HorizonRow, Observation, Region, Week};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureMatrix, FeatureTransform};
use crate::lag_state::{LagPair, LagStateStore};
use crate::models::Regressor;
use crate::policy::MissingValuePolicy;
use flu_math::Summary;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

/// A predicted incidence for one horizon row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: u64,
    pub region: Region,
    pub week: Week,
    pub value: f64,
}

/// Output of one forecast week
#[derive(Debug, Clone)]
pub struct WeekForecast {
    pub week: Week,
    /// In batch order
    pub predictions: Vec<Prediction>,
    /// The feature rows handed to the regressor
    pub features: FeatureMatrix,
    /// Rows whose region had no lag state
    pub fallbacks: usize,
}

/// Complete output of a forecast run, sorted by identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    predictions: Vec<Prediction>,
    weeks: usize,
    fallbacks: usize,
}

impl Forecast {
    pub fn predictions(&self) -> &[Prediction] {
        &self.predictions
    }

    pub fn get(&self, id: u64) -> Option<&Prediction> {
        self.predictions
            .binary_search_by_key(&id, |p| p.id)
            .ok()
            .map(|idx| &self.predictions[idx])
    }

    pub fn values_by_id(&self) -> BTreeMap<u64, f64> {
        self.predictions.iter().map(|p| (p.id, p.value)).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.predictions.iter().map(|p| p.value).collect()
    }

    /// Number of distinct weeks processed
    pub fn weeks(&self) -> usize {
        self.weeks
    }

    /// Rows served by the unseen-region fallback
    pub fn fallbacks(&self) -> usize {
        self.fallbacks
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Distribution of the predicted values, `None` for an empty forecast
    pub fn summary(&self) -> Option<Summary> {
        if self.is_empty() {
            return None;
        }
        Summary::from_values(&self.values()).ok()
    }
}

/// Drives a fitted regressor week by week over a forecast horizon
#[derive(Debug)]
pub struct RecursiveForecaster<'a, T, M> {
    transform: &'a T,
    model: &'a M,
    policy: MissingValuePolicy,
}

impl<'a, T, M> RecursiveForecaster<'a, T, M>
where
    T: FeatureTransform,
    M: Regressor,
{
    pub fn new(transform: &'a T, model: &'a M) -> Self {
        Self {
            transform,
            model,
            policy: MissingValuePolicy::default(),
        }
    }

    /// Policy for lag seeding and the unseen-region fallback
    pub fn with_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Forecast `horizon`, seeding lag state and rolling statistics from `history`
    pub fn forecast(&self, history: &[Observation], horizon: &[HorizonRow]) -> Result<Forecast> {
        let state = LagStateStore::seed(history, self.policy);
        let (forecast, _) = self.forecast_from(state, history, horizon)?;
        Ok(forecast)
    }

    /// Forecast `horizon` starting from an explicit lag state.
    ///
    /// The state is consumed and handed back advanced past the last week.
    /// On error it is dropped together with any predictions made so far.
    pub fn forecast_from(
        &self,
        mut state: LagStateStore,
        reference: &[Observation],
        horizon: &[HorizonRow],
    ) -> Result<(Forecast, LagStateStore)> {
        validate_horizon(horizon)?;
        self.check_features()?;

        let prepared = self.transform.prepare(horizon, reference)?;

        let mut weeks: BTreeMap<Week, Vec<usize>> = BTreeMap::new();
        for (idx, row) in horizon.iter().enumerate() {
            weeks.entry(row.week).or_default().push(idx);
        }

        info!(
            rows = horizon.len(),
            weeks = weeks.len(),
            seeded_regions = state.len(),
            "Starting recursive forecast"
        );

        let mut predictions = Vec::with_capacity(horizon.len());
        let mut fallbacks = 0;
        for (week, indices) in &weeks {
            let batch: Vec<(&HorizonRow, &T::Prepared)> = indices
                .iter()
                .map(|&idx| (&horizon[idx], &prepared[idx]))
                .collect();

            let step = self.run_week(&mut state, *week, &batch)?;
            fallbacks += step.fallbacks;
            predictions.extend(step.predictions);
        }

        predictions.sort_by_key(|p| p.id);
        info!(
            predictions = predictions.len(),
            fallbacks, "Recursive forecast complete"
        );

        let forecast = Forecast {
            predictions,
            weeks: weeks.len(),
            fallbacks,
        };
        Ok((forecast, state))
    }

    /// Forecast a single week and advance `state`.
    ///
    /// All `rows` must belong to the same week. Their lag-independent
    /// features are prepared from `rows` alone.
    pub fn forecast_week(
        &self,
        state: &mut LagStateStore,
        reference: &[Observation],
        rows: &[HorizonRow],
    ) -> Result<WeekForecast> {
        let week = match rows.first() {
            Some(row) => row.week,
            None => {
                return Err(ForecastError::DataError(
                    "Cannot forecast an empty week".to_string(),
                ))
            }
        };
        if let Some(other) = rows.iter().find(|row| row.week != week) {
            return Err(ForecastError::DataError(format!(
                "Row {} belongs to week {}, expected {}",
                other.id, other.week, week
            )));
        }
        validate_horizon(rows)?;
        self.check_features()?;

        let prepared = self.transform.prepare(rows, reference)?;
        let batch: Vec<(&HorizonRow, &T::Prepared)> = rows.iter().zip(prepared.iter()).collect();

        self.run_week(state, week, &batch)
    }

    /// Every column the regressor needs must come out of the transform
    fn check_features(&self) -> Result<()> {
        let produced: HashSet<String> = self.transform.columns().into_iter().collect();
        if let Some(missing) = self
            .model
            .feature_names()
            .iter()
            .find(|name| !produced.contains(*name))
        {
            return Err(ForecastError::MissingFeature(missing.clone()));
        }
        Ok(())
    }

    fn run_week(
        &self,
        state: &mut LagStateStore,
        week: Week,
        batch: &[(&HorizonRow, &T::Prepared)],
    ) -> Result<WeekForecast> {
        // Fixed before any region of this week is advanced
        let fallback = state.fallback(self.policy);

        let mut features = FeatureMatrix::new(self.transform.columns());
        let mut unseen = Vec::new();
        for (row, prepared) in batch {
            let lags = match state.get(&row.region) {
                Some(lags) => lags,
                None => {
                    warn!(
                        region = %row.region,
                        week = %week,
                        lag1 = fallback.lag1,
                        lag2 = fallback.lag2,
                        "Region has no lag state, using cross-region fallback"
                    );
                    unseen.push(row.region.clone());
                    fallback
                }
            };
            ensure_finite_lags(week, &row.region, lags)?;

            features.push(self.transform.assemble(prepared, lags)?)?;
        }

        let features = features.select(self.model.feature_names())?;
        let raw = self
            .model
            .predict(&features)
            .map_err(|err| ForecastError::RegressorFailure {
                week,
                message: err.to_string(),
            })?;
        if raw.len() != batch.len() {
            return Err(ForecastError::RegressorFailure {
                week,
                message: format!(
                    "Expected {} predictions, got {}",
                    batch.len(),
                    raw.len()
                ),
            });
        }

        let mut predictions = Vec::with_capacity(batch.len());
        for ((row, _), value) in batch.iter().zip(raw) {
            if !value.is_finite() {
                return Err(ForecastError::RegressorFailure {
                    week,
                    message: format!("Non-finite prediction {} for region {}", value, row.region),
                });
            }
            predictions.push(Prediction {
                id: row.id,
                region: row.region.clone(),
                week,
                value: value.max(0.0),
            });
        }

        // Only now does this week's output become next week's lag1
        for region in &unseen {
            state.insert(region.clone(), fallback);
        }
        for prediction in &predictions {
            state.advance(&prediction.region, prediction.value)?;
        }

        debug!(
            week = %week,
            rows = predictions.len(),
            fallbacks = unseen.len(),
            "Forecast week complete"
        );

        Ok(WeekForecast {
            week,
            predictions,
            features,
            fallbacks: unseen.len(),
        })
    }
}

fn ensure_finite_lags(week: Week, region: &Region, lags: LagPair) -> Result<()> {
    for (feature, value) in [("lag1", lags.lag1), ("lag2", lags.lag2)] {
        if !value.is_finite() {
            return Err(ForecastError::NonFiniteValue {
                week,
                region: region.clone(),
                feature: feature.to_string(),
                value,
            });
        }
    }
    Ok(())
}

/// Identifiers are unique and a region appears at most once per week
fn validate_horizon(rows: &[HorizonRow]) -> Result<()> {
    let mut ids = HashSet::with_capacity(rows.len());
    let mut slots = HashSet::with_capacity(rows.len());
    for row in rows {
        if !ids.insert(row.id) {
            return Err(ForecastError::DuplicateRow(format!(
                "identifier {} appears more than once",
                row.id
            )));
        }
        if !slots.insert((&row.region, row.week)) {
            return Err(ForecastError::DuplicateRow(format!(
                "region {} appears more than once in week {}",
                row.region, row.week
            )));
        }
    }
    Ok(())
}
