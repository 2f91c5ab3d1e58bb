//! Regions, weeks and the tables the forecaster consumes

use crate::error::{ForecastError, Result};
use chrono::{NaiveDate, Weekday};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::Path;

/// Opaque categorical region code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    /// Create a region from its code
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Region {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// ISO year and week number.
///
/// Ordering is chronological: by year, then by week number. Serialized as
/// its `YYYYWW` code and validated again when deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Week {
    year: i32,
    number: u32,
}

impl Week {
    /// Create a week, checking the number against the ISO calendar of `year`
    pub fn new(year: i32, number: u32) -> Result<Self> {
        if NaiveDate::from_isoywd_opt(year, number, Weekday::Mon).is_none() {
            return Err(ForecastError::DataError(format!(
                "Week {} does not exist in ISO year {}",
                number, year
            )));
        }

        Ok(Self { year, number })
    }

    /// Parse the `YYYYWW` integer encoding used by the incidence tables
    pub fn from_code(code: i64) -> Result<Self> {
        if code < 0 {
            return Err(ForecastError::DataError(format!(
                "Invalid week code: {}",
                code
            )));
        }
        let year = i32::try_from(code / 100)
            .map_err(|_| ForecastError::DataError(format!("Invalid week code: {}", code)))?;

        Self::new(year, (code % 100) as u32)
    }

    /// The `YYYYWW` encoding of this week
    pub fn code(&self) -> i64 {
        self.year as i64 * 100 + self.number as i64
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Week number within the year (1-based)
    pub fn number(&self) -> u32 {
        self.number
    }
}

impl TryFrom<i64> for Week {
    type Error = ForecastError;

    fn try_from(code: i64) -> Result<Self> {
        Self::from_code(code)
    }
}

impl From<Week> for i64 {
    fn from(week: Week) -> Self {
        week.code()
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.year, self.number)
    }
}

/// Static inputs of a (region, week) row
pub trait Covariates {
    fn region(&self) -> &Region;
    fn week(&self) -> Week;
    /// Search-interest signal, `None` when not recorded for that week
    fn search_interest(&self) -> Option<f64>;
}

/// A historical region-week with known incidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub region: Region,
    pub week: Week,
    pub incidence: f64,
    pub search_interest: Option<f64>,
}

impl Observation {
    pub fn new(region: impl Into<Region>, week: Week, incidence: f64) -> Self {
        Self {
            region: region.into(),
            week,
            incidence,
            search_interest: None,
        }
    }

    /// Attach the search-interest value recorded for that week
    pub fn with_search_interest(mut self, value: f64) -> Self {
        self.search_interest = Some(value);
        self
    }
}

impl Covariates for Observation {
    fn region(&self) -> &Region {
        &self.region
    }

    fn week(&self) -> Week {
        self.week
    }

    fn search_interest(&self) -> Option<f64> {
        self.search_interest
    }
}

/// A future region-week that needs a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonRow {
    pub id: u64,
    pub region: Region,
    pub week: Week,
    pub search_interest: Option<f64>,
}

impl HorizonRow {
    pub fn new(id: u64, region: impl Into<Region>, week: Week) -> Self {
        Self {
            id,
            region: region.into(),
            week,
            search_interest: None,
        }
    }

    pub fn with_search_interest(mut self, value: f64) -> Self {
        self.search_interest = Some(value);
        self
    }
}

impl Covariates for HorizonRow {
    fn region(&self) -> &Region {
        &self.region
    }

    fn week(&self) -> Week {
        self.week
    }

    fn search_interest(&self) -> Option<f64> {
        self.search_interest
    }
}

impl From<String> for Region {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Column names of the raw incidence tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub id: String,
    pub region: String,
    pub week: String,
    pub incidence: String,
    pub search_interest: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            id: "Id".to_string(),
            region: "region_code".to_string(),
            week: "week".to_string(),
            incidence: "TauxGrippe".to_string(),
            search_interest: "google_grippe_filtered".to_string(),
        }
    }
}

/// Loads historical and horizon tables from CSV files
#[derive(Debug, Clone, Default)]
pub struct DataLoader {
    columns: ColumnNames,
}

impl DataLoader {
    pub fn new(columns: ColumnNames) -> Self {
        Self { columns }
    }

    /// Read a CSV file into a DataFrame
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Ok(df)
    }

    /// Load historical observations from a CSV file
    pub fn load_observations<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Observation>> {
        let df = Self::read_csv(path)?;
        self.observations_from_dataframe(&df)
    }

    /// Load forecast-horizon rows from a CSV file
    pub fn load_horizon<P: AsRef<Path>>(&self, path: P) -> Result<Vec<HorizonRow>> {
        let df = Self::read_csv(path)?;
        self.horizon_from_dataframe(&df)
    }

    /// Extract observations; the incidence and search-interest columns are required
    pub fn observations_from_dataframe(&self, df: &DataFrame) -> Result<Vec<Observation>> {
        let regions = self.region_column(df)?;
        let weeks = self.week_column(df)?;
        let incidence = float_column(df, &self.columns.incidence)?;
        let search = float_column(df, &self.columns.search_interest)?;

        let mut observations = Vec::with_capacity(df.height());
        for (i, ((region, week), value)) in regions
            .into_iter()
            .zip(weeks)
            .zip(incidence)
            .enumerate()
        {
            let incidence = value.ok_or_else(|| {
                ForecastError::DataError(format!(
                    "Missing {} at row {}",
                    self.columns.incidence,
                    i + 1
                ))
            })?;
            if !incidence.is_finite() || incidence < 0.0 {
                return Err(ForecastError::DataError(format!(
                    "Invalid incidence {} at row {}",
                    incidence,
                    i + 1
                )));
            }

            observations.push(Observation {
                region,
                week,
                incidence,
                search_interest: search[i],
            });
        }

        Ok(observations)
    }

    /// Extract horizon rows; the identifier and search-interest columns are required
    pub fn horizon_from_dataframe(&self, df: &DataFrame) -> Result<Vec<HorizonRow>> {
        let ids = int_column(df, &self.columns.id)?;
        let regions = self.region_column(df)?;
        let weeks = self.week_column(df)?;
        let search = float_column(df, &self.columns.search_interest)?;

        let mut rows = Vec::with_capacity(df.height());
        for (i, ((id, region), week)) in ids.into_iter().zip(regions).zip(weeks).enumerate() {
            let id = id
                .and_then(|id| u64::try_from(id).ok())
                .ok_or_else(|| {
                    ForecastError::DataError(format!(
                        "Missing or negative {} at row {}",
                        self.columns.id,
                        i + 1
                    ))
                })?;

            rows.push(HorizonRow {
                id,
                region,
                week,
                search_interest: search[i],
            });
        }

        Ok(rows)
    }

    fn region_column(&self, df: &DataFrame) -> Result<Vec<Region>> {
        let name = &self.columns.region;
        let series = required_column(df, name)?.cast(&DataType::Utf8)?;

        let regions = series
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(i, code)| {
                code.map(Region::new).ok_or_else(|| {
                    ForecastError::DataError(format!("Missing {} at row {}", name, i + 1))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(regions)
    }

    fn week_column(&self, df: &DataFrame) -> Result<Vec<Week>> {
        let name = &self.columns.week;

        int_column(df, name)?
            .into_iter()
            .enumerate()
            .map(|(i, code)| {
                let code = code.ok_or_else(|| {
                    ForecastError::DataError(format!("Missing {} at row {}", name, i + 1))
                })?;
                Week::from_code(code)
            })
            .collect()
    }
}

fn required_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    if !df.get_column_names().iter().any(|c| *c == name) {
        return Err(ForecastError::MissingColumn(name.to_string()));
    }

    Ok(df.column(name)?)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = required_column(df, name)?.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}

fn int_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let series = required_column(df, name)?.cast(&DataType::Int64)?;
    let values = series.i64()?.into_iter().collect();
    Ok(values)
}
