//! Descriptive statistics over incidence values
//!
//! Every function returns `None` when the statistic is undefined for the
//! input (empty slice, or a single value for the sample standard deviation)
//! instead of leaking `NaN` to the caller.

use statrs::statistics::{Data, Median, Statistics};

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Median, averaging the two central values for even-length input
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Data::new(values.to_vec()).median())
}

/// Sample standard deviation (n - 1 denominator)
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev())
}

/// Largest value
pub fn max(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Statistics::max(values.iter()))
}

/// Smallest value
pub fn min(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(Statistics::min(values.iter()))
}
