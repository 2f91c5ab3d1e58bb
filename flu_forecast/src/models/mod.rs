//! Fitted regressors consumed by the forecast engine

use crate::error::Result;
use crate::features::FeatureMatrix;

/// A trained model mapping feature rows to incidence
pub trait Regressor {
    /// Feature columns the model was trained on, in training order
    fn feature_names(&self) -> &[String];

    /// Predict one value per row of `features`.
    ///
    /// Columns of `features` follow [`Regressor::feature_names`]; each row
    /// also carries its categorical region code.
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;
}

impl<M: Regressor + ?Sized> Regressor for Box<M> {
    fn feature_names(&self) -> &[String] {
        (**self).feature_names()
    }

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        (**self).predict(features)
    }
}

pub mod linear;

pub use linear::{check_ridge, LinearRegressor, MIN_RIDGE};
