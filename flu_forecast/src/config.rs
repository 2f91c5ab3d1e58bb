//! Run configuration
//!
//! Every field has a default, so a JSON file only needs the values it
//! changes:
//!
//! ```json
//! { "train_csv": "data/train_enrichi.csv", "feature_set": "extended", "version": "v12" }
//! ```

use crate::data::ColumnNames;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureSet, FluSeason};
use crate::models::check_ridge;
use crate::policy::MissingValuePolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Historical table (observations)
    pub train_csv: PathBuf,
    /// Forecast-horizon table
    pub test_csv: PathBuf,
    /// Saved regressor; fitted from `train_csv` when absent
    pub model_path: Option<PathBuf>,
    pub submission_dir: PathBuf,
    /// Tag in the submission file name
    pub version: String,
    pub columns: ColumnNames,
    pub feature_set: FeatureSet,
    pub missing_policy: MissingValuePolicy,
    pub flu_season: FluSeason,
    /// Ridge penalty when fitting the regressor, at least [`MIN_RIDGE`](crate::models::MIN_RIDGE)
    pub ridge: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            train_csv: PathBuf::from("train_enrichi.csv"),
            test_csv: PathBuf::from("test_enrichi.csv"),
            model_path: None,
            submission_dir: PathBuf::from("submissions"),
            version: "v13".to_string(),
            columns: ColumnNames::default(),
            feature_set: FeatureSet::Compact,
            missing_policy: MissingValuePolicy::Median,
            flu_season: FluSeason::default(),
            ridge: 1.0,
        }
    }
}

impl ForecastConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        check_ridge(self.ridge)?;
        if self.version.trim().is_empty() {
            return Err(ForecastError::InvalidParameter(
                "version must not be empty".to_string(),
            ));
        }
        self.flu_season.validate()
    }

    /// `<submission_dir>/submission_<version>.csv`
    pub fn submission_path(&self) -> PathBuf {
        self.submission_dir
            .join(format!("submission_{}.csv", self.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MIN_RIDGE;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ForecastConfig::from_json_str(
            r#"{ "feature_set": "extended", "version": "v12", "columns": { "incidence": "rate" } }"#,
        )
        .unwrap();

        assert_eq!(config.feature_set, FeatureSet::Extended);
        assert_eq!(config.version, "v12");
        assert_eq!(config.columns.incidence, "rate");
        assert_eq!(config.columns.region, "region_code");
        assert_eq!(config.ridge, 1.0);
        assert_eq!(
            config.submission_path(),
            PathBuf::from("submissions").join("submission_v12.csv")
        );
    }

    #[test]
    fn test_round_trip() {
        let mut config = ForecastConfig::default();
        config.missing_policy = MissingValuePolicy::Constant(2.5);
        config.model_path = Some(PathBuf::from("model.json"));

        let json = config.to_json().unwrap();
        assert_eq!(ForecastConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_validation() {
        assert!(ForecastConfig::from_json_str(r#"{ "ridge": -1.0 }"#).is_err());
        assert!(matches!(
            ForecastConfig::from_json_str(r#"{ "ridge": 0.0 }"#),
            Err(ForecastError::InvalidParameter(_))
        ));
        let smallest = format!(r#"{{ "ridge": {} }}"#, MIN_RIDGE);
        assert_eq!(ForecastConfig::from_json_str(&smallest).unwrap().ridge, MIN_RIDGE);
        assert!(ForecastConfig::from_json_str(r#"{ "version": " " }"#).is_err());
        assert!(
            ForecastConfig::from_json_str(r#"{ "flu_season": { "start_week": 60, "end_week": 12 } }"#)
                .is_err()
        );
        assert!(ForecastConfig::from_json_str("not json").is_err());
    }
}
