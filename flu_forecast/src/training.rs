//! Training frames built with the same feature path as forecasting

use crate::data::{Observation, Week};
use crate::error::{ForecastError, Result};
use crate::features::{FeatureMatrix, FeatureTransform};
use crate::lag_state::LagPair;
use crate::policy::MissingValuePolicy;
use std::collections::HashMap;
use tracing::debug;

/// Feature rows of the history with their observed incidence
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub features: FeatureMatrix,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Split into (earlier years, latest year)
    pub fn holdout_last_year(&self) -> Result<(TrainingSet, TrainingSet)> {
        let last_year = self
            .features
            .rows()
            .iter()
            .map(|row| row.week.year())
            .max()
            .ok_or_else(|| ForecastError::DataError("Empty training set".to_string()))?;

        let (train_idx, holdout_idx): (Vec<usize>, Vec<usize>) = (0..self.len())
            .partition(|&i| self.features.rows()[i].week.year() < last_year);

        Ok((self.subset(&train_idx), self.subset(&holdout_idx)))
    }

    fn subset(&self, indices: &[usize]) -> TrainingSet {
        TrainingSet {
            features: self.features.subset(indices),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
        }
    }
}

/// Build the training frame of `history`.
///
/// Rows are ordered by (region, week); lag1 and lag2 are the region's two
/// previous observations. The first rows of a region have no previous week;
/// those gaps are filled per lag column with `policy`, over all rows, the
/// same policy the forecaster applies to unseen regions. The history is also
/// its own rolling-statistics reference.
pub fn build_training_set<T: FeatureTransform>(
    transform: &T,
    history: &[Observation],
    policy: MissingValuePolicy,
) -> Result<TrainingSet> {
    let mut rows: Vec<&Observation> = history.iter().collect();
    rows.sort_by(|a, b| (&a.region, a.week).cmp(&(&b.region, b.week)));
    let rows: Vec<Observation> = rows.into_iter().cloned().collect();

    let mut lag1 = Vec::with_capacity(rows.len());
    let mut lag2 = Vec::with_capacity(rows.len());
    let mut recent: HashMap<_, (Option<f64>, Option<f64>)> = HashMap::new();
    for obs in &rows {
        let (prev1, prev2) = recent.get(&obs.region).copied().unwrap_or((None, None));
        lag1.push(prev1);
        lag2.push(prev2);
        recent.insert(obs.region.clone(), (Some(obs.incidence), prev1));
    }
    let lag1 = policy.fill_column(&lag1);
    let lag2 = policy.fill_column(&lag2);

    let prepared = transform.prepare(&rows, &rows)?;
    let mut features = FeatureMatrix::new(transform.columns());
    for (i, prepared) in prepared.iter().enumerate() {
        features.push(transform.assemble(prepared, LagPair::new(lag1[i], lag2[i]))?)?;
    }

    debug!(rows = rows.len(), "Built training set");

    Ok(TrainingSet {
        features,
        targets: rows.iter().map(|obs| obs.incidence).collect(),
    })
}

/// Distinct weeks covered by a set of observations, in order
pub fn weeks_of(history: &[Observation]) -> Vec<Week> {
    let mut weeks: Vec<Week> = history.iter().map(|obs| obs.week).collect();
    weeks.sort();
    weeks.dedup();
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureSet, SeasonalTransform};
    use pretty_assertions::assert_eq;

    fn history() -> Vec<Observation> {
        let w = |year, number| Week::new(year, number).unwrap();
        vec![
            Observation::new("B", w(2015, 2), 7.0),
            Observation::new("A", w(2015, 3), 30.0),
            Observation::new("A", w(2015, 1), 10.0),
            Observation::new("A", w(2015, 2), 20.0),
            Observation::new("B", w(2016, 1), 9.0),
        ]
    }

    #[test]
    fn test_training_lags_follow_each_region() {
        let transform = SeasonalTransform::new(FeatureSet::Compact);
        let set = build_training_set(&transform, &history(), MissingValuePolicy::Median).unwrap();

        assert_eq!(set.len(), 5);
        assert_eq!(set.targets, vec![10.0, 20.0, 30.0, 7.0, 9.0]);

        let lag1 = set.features.column("taux_lag1").unwrap();
        let lag2 = set.features.column("taux_lag2").unwrap();
        // Known lag1: 10, 20, 7 -> median 10. Known lag2: 10 -> median 10.
        assert_eq!(lag1, vec![10.0, 10.0, 20.0, 10.0, 7.0]);
        assert_eq!(lag2, vec![10.0, 10.0, 10.0, 10.0, 10.0]);

        let diff = set.features.column("taux_diff1").unwrap();
        assert_eq!(diff, vec![0.0, 0.0, 10.0, 0.0, -3.0]);
    }

    #[test]
    fn test_holdout_last_year() {
        let transform = SeasonalTransform::new(FeatureSet::Compact);
        let set = build_training_set(&transform, &history(), MissingValuePolicy::Median).unwrap();

        let (train, holdout) = set.holdout_last_year().unwrap();
        assert_eq!(train.len(), 4);
        assert_eq!(holdout.len(), 1);
        assert_eq!(holdout.targets, vec![9.0]);
    }

    #[test]
    fn test_weeks_of() {
        let weeks = weeks_of(&history());
        assert_eq!(weeks.len(), 4);
        assert_eq!(weeks[0], Week::new(2015, 1).unwrap());
        assert_eq!(weeks[3], Week::new(2016, 1).unwrap());
    }
}
