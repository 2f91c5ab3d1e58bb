//! Rolling historical statistics per (region, week number)

use crate::data::{Observation, Region};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Incidence aggregates for one region and one calendar week number,
/// taken across all years of the reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingStat {
    pub mean: f64,
    pub median: f64,
    /// Undefined with fewer than two years of history
    pub std: Option<f64>,
    pub max: f64,
    pub count: usize,
}

impl RollingStat {
    fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: flu_math::mean(values)?,
            median: flu_math::median(values)?,
            std: flu_math::sample_std(values),
            max: flu_math::max(values)?,
            count: values.len(),
        })
    }
}

/// Lookup table of [`RollingStat`] keyed by (region, week number)
#[derive(Debug, Clone, Default)]
pub struct RollingStats {
    table: HashMap<(Region, u32), RollingStat>,
}

impl RollingStats {
    pub fn from_observations(reference: &[Observation]) -> Self {
        let mut groups: HashMap<(Region, u32), Vec<f64>> = HashMap::new();
        for obs in reference {
            groups
                .entry((obs.region.clone(), obs.week.number()))
                .or_default()
                .push(obs.incidence);
        }

        let table = groups
            .into_iter()
            .filter_map(|(key, values)| RollingStat::from_values(&values).map(|stat| (key, stat)))
            .collect();

        Self { table }
    }

    pub fn get(&self, region: &Region, week_number: u32) -> Option<&RollingStat> {
        self.table.get(&(region.clone(), week_number))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
