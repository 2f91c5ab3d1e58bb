//! # Flu Forecast Workspace
//!
//! Umbrella crate for the influenza forecasting workspace.
//!
//! - [`flu_math`]: descriptive statistics, error metrics and the linear solver
//! - [`flu_forecast`]: data loading, feature transform, lag state, recursive engine
//!
//! ## Example
//!
//! ```
//! use flu_forecast_workspace::flu_forecast::{LagPair, LagStateStore, Region};
//!
//! let mut state = LagStateStore::new();
//! state.insert(Region::new("11"), LagPair::new(2.0, 1.0));
//! let lags = state.advance(&Region::new("11"), 4.0).unwrap();
//! assert_eq!(lags, LagPair::new(4.0, 2.0));
//! ```

pub use flu_forecast;
pub use flu_math;
