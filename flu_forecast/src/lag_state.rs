//! Per-region autoregressive state
//!
//! The store holds, for every region, the two most recent incidence values
//! (observed, then predicted once forecasting starts). It is an owned value
//! scoped to one forecast run.

use crate::data::{Observation, Region, Week};
use crate::error::{ForecastError, Result};
use crate::policy::MissingValuePolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Incidence one and two weeks before the week being forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagPair {
    pub lag1: f64,
    pub lag2: f64,
}

impl LagPair {
    pub fn new(lag1: f64, lag2: f64) -> Self {
        Self { lag1, lag2 }
    }
}

/// Region -> (lag1, lag2)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LagStateStore {
    lags: BTreeMap<Region, LagPair>,
}

impl LagStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the tail of each region's history.
    ///
    /// lag1 is the latest observation and lag2 the one before it. A region
    /// with a single observation gets its lag2 from `policy` applied to that
    /// region's own values. Regions without observations get no entry.
    pub fn seed(observations: &[Observation], policy: MissingValuePolicy) -> Self {
        let mut by_region: BTreeMap<&Region, Vec<(Week, f64)>> = BTreeMap::new();
        for obs in observations {
            by_region
                .entry(&obs.region)
                .or_default()
                .push((obs.week, obs.incidence));
        }

        let mut lags = BTreeMap::new();
        for (region, mut series) in by_region {
            series.sort_by_key(|(week, _)| *week);
            let values: Vec<f64> = series.iter().map(|(_, value)| *value).collect();

            let pair = match values.as_slice() {
                [] => continue,
                [only] => LagPair::new(*only, policy.fill_value(&values)),
                [.., second_last, last] => LagPair::new(*last, *second_last),
            };
            lags.insert(region.clone(), pair);
        }

        Self { lags }
    }

    /// Snapshot of a region's lags
    pub fn get(&self, region: &Region) -> Option<LagPair> {
        self.lags.get(region).copied()
    }

    /// Set a region's lags directly, replacing any previous entry
    pub fn insert(&mut self, region: Region, lags: LagPair) {
        self.lags.insert(region, lags);
    }

    /// Shift in a new value: lag2 <- lag1, lag1 <- value.
    ///
    /// Returns the pair now in effect.
    pub fn advance(&mut self, region: &Region, value: f64) -> Result<LagPair> {
        let lags = self.lags.get_mut(region).ok_or_else(|| {
            ForecastError::DataError(format!("No lag state for region {}", region))
        })?;

        lags.lag2 = lags.lag1;
        lags.lag1 = value;
        Ok(*lags)
    }

    /// Lags substituted for a region without an entry: `policy` applied to
    /// the lag1 (and lag2) values currently known across regions.
    pub fn fallback(&self, policy: MissingValuePolicy) -> LagPair {
        let lag1: Vec<f64> = self.lags.values().map(|lags| lags.lag1).collect();
        let lag2: Vec<f64> = self.lags.values().map(|lags| lags.lag2).collect();

        LagPair::new(policy.fill_value(&lag1), policy.fill_value(&lag2))
    }

    pub fn len(&self) -> usize {
        self.lags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lags.is_empty()
    }
}
