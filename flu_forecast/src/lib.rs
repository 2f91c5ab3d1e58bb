//! # Flu Forecast
//!
//! Weekly, region-level influenza incidence forecasting with a recursive
//! multi-step engine.
//!
//! ## Features
//!
//! - Incidence tables loaded from CSV (historical observations and the forecast horizon)
//! - Seasonal feature transform: week harmonics, flu-season window, rolling history, search interest
//! - Per-region lag state fed by the model's own predictions
//! - One recursive engine for any transform and regressor
//! - Ridge linear regressor with region offsets, saved as JSON
//! - Submission output sorted by identifier
//!
//! ## Quick Start
//!
//! ```rust
//! use flu_forecast::{
//!     FeatureSet, HorizonRow, LinearRegressor, Observation, RecursiveForecaster,
//!     SeasonalTransform, Week,
//! };
//!
//! # fn main() -> flu_forecast::Result<()> {
//! let history = vec![
//!     Observation::new("11", Week::new(2015, 51)?, 40.0),
//!     Observation::new("11", Week::new(2015, 52)?, 55.0),
//! ];
//! let horizon = vec![
//!     HorizonRow::new(1, "11", Week::new(2016, 1)?),
//!     HorizonRow::new(2, "11", Week::new(2016, 2)?),
//! ];
//!
//! // A persistence model: next week equals last week
//! let model = LinearRegressor::new(vec!["taux_lag1".to_string()], vec![1.0], 0.0)?;
//! let transform = SeasonalTransform::new(FeatureSet::Compact);
//!
//! let forecast = RecursiveForecaster::new(&transform, &model).forecast(&history, &horizon)?;
//! assert_eq!(forecast.values(), vec![55.0, 55.0]);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod features;
pub mod lag_state;
pub mod models;
pub mod policy;
pub mod submission;
pub mod training;

// Re-export commonly used types
pub use crate::config::ForecastConfig;
pub use crate::data::{ColumnNames, Covariates, DataLoader, HorizonRow, Observation, Region, Week};
pub use crate::engine::{Forecast, Prediction, RecursiveForecaster, WeekForecast};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{
    FeatureMatrix, FeatureRow, FeatureSet, FeatureTransform, FluSeason, SeasonalTransform,
};
pub use crate::lag_state::{LagPair, LagStateStore};
pub use crate::models::{LinearRegressor, Regressor, MIN_RIDGE};
pub use crate::policy::MissingValuePolicy;
pub use crate::training::{build_training_set, TrainingSet};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
