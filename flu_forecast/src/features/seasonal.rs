//! Seasonal feature transform
//!
//! Cyclical week encodings, a flu-season indicator, rolling history,
//! log search interest and the lag interactions, in one of two column sets.

use super::{FeatureRow, FeatureTransform, RollingStats};
use crate::data::{Covariates, Observation, Region, Week};
use crate::error::{ForecastError, Result};
use crate::lag_state::LagPair;
use crate::policy::MissingValuePolicy;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Weeks per seasonal cycle used by the harmonics
const WEEKS_PER_CYCLE: f64 = 52.0;

/// A single feature the transform knows how to compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureColumn {
    Sin1,
    Cos1,
    Cos2,
    IsFluSeason,
    RwMean,
    RwMedian,
    RwStd,
    RwMax,
    GoogleLog,
    GoogleXRw,
    Lag1,
    Lag2,
    Lag1XSeason,
    Lag1XGoogle,
    Diff1,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 15] = [
        FeatureColumn::Sin1,
        FeatureColumn::Cos1,
        FeatureColumn::Cos2,
        FeatureColumn::IsFluSeason,
        FeatureColumn::RwMean,
        FeatureColumn::RwMedian,
        FeatureColumn::RwStd,
        FeatureColumn::RwMax,
        FeatureColumn::GoogleLog,
        FeatureColumn::GoogleXRw,
        FeatureColumn::Lag1,
        FeatureColumn::Lag2,
        FeatureColumn::Lag1XSeason,
        FeatureColumn::Lag1XGoogle,
        FeatureColumn::Diff1,
    ];

    /// Column name in feature matrices and persisted models
    pub fn name(&self) -> &'static str {
        match self {
            FeatureColumn::Sin1 => "sin_1",
            FeatureColumn::Cos1 => "cos_1",
            FeatureColumn::Cos2 => "cos_2",
            FeatureColumn::IsFluSeason => "is_flu_season",
            FeatureColumn::RwMean => "rw_mean",
            FeatureColumn::RwMedian => "rw_median",
            FeatureColumn::RwStd => "rw_std",
            FeatureColumn::RwMax => "rw_max",
            FeatureColumn::GoogleLog => "google_log",
            FeatureColumn::GoogleXRw => "google_x_rw",
            FeatureColumn::Lag1 => "taux_lag1",
            FeatureColumn::Lag2 => "taux_lag2",
            FeatureColumn::Lag1XSeason => "lag1_x_season",
            FeatureColumn::Lag1XGoogle => "lag1_x_google",
            FeatureColumn::Diff1 => "taux_diff1",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|column| column.name() == name)
    }

    /// Value of this column for a prepared row and a lag pair.
    ///
    /// The lag interactions are defined here and nowhere else.
    pub fn value(&self, row: &StaticFeatures, lags: LagPair) -> f64 {
        match self {
            FeatureColumn::Sin1 => row.sin_1,
            FeatureColumn::Cos1 => row.cos_1,
            FeatureColumn::Cos2 => row.cos_2,
            FeatureColumn::IsFluSeason => row.is_flu_season,
            FeatureColumn::RwMean => row.rw_mean,
            FeatureColumn::RwMedian => row.rw_median,
            FeatureColumn::RwStd => row.rw_std,
            FeatureColumn::RwMax => row.rw_max,
            FeatureColumn::GoogleLog => row.google_log,
            FeatureColumn::GoogleXRw => row.google_x_rw,
            FeatureColumn::Lag1 => lags.lag1,
            FeatureColumn::Lag2 => lags.lag2,
            FeatureColumn::Lag1XSeason => lags.lag1 * row.is_flu_season,
            FeatureColumn::Lag1XGoogle => lags.lag1 * row.google_log,
            FeatureColumn::Diff1 => lags.lag1 - lags.lag2,
        }
    }
}

/// Column sets of the two model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSet {
    /// 11 features
    #[default]
    Compact,
    /// 15 features
    Extended,
}

impl FeatureSet {
    pub fn columns(&self) -> &'static [FeatureColumn] {
        use FeatureColumn::*;

        match self {
            FeatureSet::Compact => &[
                Lag1XSeason,
                Lag1,
                Lag1XGoogle,
                RwMax,
                RwStd,
                Diff1,
                GoogleXRw,
                GoogleLog,
                Lag2,
                Cos1,
                Sin1,
            ],
            FeatureSet::Extended => &[
                Lag1,
                Lag1XSeason,
                RwMax,
                Lag1XGoogle,
                RwStd,
                Diff1,
                GoogleLog,
                Lag2,
                GoogleXRw,
                Cos1,
                Sin1,
                RwMedian,
                Cos2,
                RwMean,
                IsFluSeason,
            ],
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(|c| c.name().to_string()).collect()
    }
}

/// Window of week numbers counted as flu season, wrapping over the year end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FluSeason {
    /// First week of the season (autumn)
    pub start_week: u32,
    /// Last week of the season (following year)
    pub end_week: u32,
}

impl Default for FluSeason {
    fn default() -> Self {
        Self {
            start_week: 45,
            end_week: 12,
        }
    }
}

impl FluSeason {
    pub fn new(start_week: u32, end_week: u32) -> Result<Self> {
        let season = Self {
            start_week,
            end_week,
        };
        season.validate()?;
        Ok(season)
    }

    pub fn validate(&self) -> Result<()> {
        for week in [self.start_week, self.end_week] {
            if !(1..=53).contains(&week) {
                return Err(ForecastError::InvalidParameter(format!(
                    "Flu season week must be between 1 and 53, got {}",
                    week
                )));
            }
        }
        Ok(())
    }

    pub fn contains(&self, week_number: u32) -> bool {
        if self.start_week <= self.end_week {
            (self.start_week..=self.end_week).contains(&week_number)
        } else {
            week_number >= self.start_week || week_number <= self.end_week
        }
    }
}

/// Lag-independent features of one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticFeatures {
    pub region: Region,
    pub week: Week,
    pub sin_1: f64,
    pub cos_1: f64,
    pub cos_2: f64,
    pub is_flu_season: f64,
    pub rw_mean: f64,
    pub rw_median: f64,
    pub rw_std: f64,
    pub rw_max: f64,
    pub google_log: f64,
    pub google_x_rw: f64,
}

/// The seasonal transform used by both model variants
#[derive(Debug, Clone, Default)]
pub struct SeasonalTransform {
    feature_set: FeatureSet,
    flu_season: FluSeason,
    policy: MissingValuePolicy,
}

impl SeasonalTransform {
    pub fn new(feature_set: FeatureSet) -> Self {
        Self {
            feature_set,
            ..Self::default()
        }
    }

    pub fn with_flu_season(mut self, flu_season: FluSeason) -> Self {
        self.flu_season = flu_season;
        self
    }

    /// Policy for (region, week number) pairs missing from the rolling history
    pub fn with_policy(mut self, policy: MissingValuePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn feature_set(&self) -> FeatureSet {
        self.feature_set
    }
}

impl FeatureTransform for SeasonalTransform {
    type Prepared = StaticFeatures;

    fn columns(&self) -> Vec<String> {
        self.feature_set.column_names()
    }

    fn prepare<R: Covariates>(
        &self,
        rows: &[R],
        reference: &[Observation],
    ) -> Result<Vec<StaticFeatures>> {
        let rolling = RollingStats::from_observations(reference);

        let mut means = Vec::with_capacity(rows.len());
        let mut medians = Vec::with_capacity(rows.len());
        let mut stds = Vec::with_capacity(rows.len());
        let mut maxes = Vec::with_capacity(rows.len());
        for row in rows {
            let stat = rolling.get(row.region(), row.week().number());
            means.push(stat.map(|s| s.mean));
            medians.push(stat.map(|s| s.median));
            stds.push(stat.and_then(|s| s.std));
            maxes.push(stat.map(|s| s.max));
        }

        let means = self.policy.fill_column(&means);
        let medians = self.policy.fill_column(&medians);
        let stds = self.policy.fill_column(&stds);
        let maxes = self.policy.fill_column(&maxes);

        let prepared = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let week = row.week();
                let angle = 2.0 * PI * week.number() as f64 / WEEKS_PER_CYCLE;
                let google_log = row.search_interest().unwrap_or(0.0).ln_1p();

                StaticFeatures {
                    region: row.region().clone(),
                    week,
                    sin_1: angle.sin(),
                    cos_1: angle.cos(),
                    cos_2: (2.0 * angle).cos(),
                    is_flu_season: if self.flu_season.contains(week.number()) {
                        1.0
                    } else {
                        0.0
                    },
                    rw_mean: means[i],
                    rw_median: medians[i],
                    rw_std: stds[i],
                    rw_max: maxes[i],
                    google_log,
                    google_x_rw: google_log * means[i],
                }
            })
            .collect();

        Ok(prepared)
    }

    fn assemble(&self, prepared: &StaticFeatures, lags: LagPair) -> Result<FeatureRow> {
        let values = self
            .feature_set
            .columns()
            .iter()
            .map(|column| column.value(prepared, lags))
            .collect();

        let row = FeatureRow::new(prepared.region.clone(), prepared.week, values);
        row.ensure_finite(&self.columns())?;
        Ok(row)
    }
}
