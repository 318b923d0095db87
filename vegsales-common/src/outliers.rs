//! Per-vegetable outlier tagging
//!
//! A monthly total is an outlier when it exceeds its vegetable's mean plus five sample
//! standard deviations. Groups with fewer than two points never flag.

use std::collections::HashMap;

use crate::models::MonthlyAggregate;

/// Number of standard deviations above the mean that marks an outlier
pub const OUTLIER_SIGMAS: f64 = 5.0;

/// Summary statistics for one vegetable's monthly totals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); `None` below two points
    pub std_dev: Option<f64>,
}

impl GroupStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std_dev = (count >= 2).then(|| {
            let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (sum_sq / (count - 1) as f64).sqrt()
        });

        Some(Self { count, mean, std_dev })
    }

    /// Upper bound above which a value is flagged, if defined
    pub fn threshold(&self) -> Option<f64> {
        self.std_dev
            .filter(|sd| sd.is_finite())
            .map(|sd| self.mean + OUTLIER_SIGMAS * sd)
    }

    pub fn is_outlier(&self, value: f64) -> bool {
        self.threshold().is_some_and(|limit| value > limit)
    }
}

/// Set `is_outlier` on every aggregate, partitioned by vegetable
///
/// Order of the input is preserved; every flag is recomputed from scratch.
pub fn tag_outliers(mut aggregates: Vec<MonthlyAggregate>) -> Vec<MonthlyAggregate> {
    let mut groups: HashMap<&str, Vec<f64>> = HashMap::new();
    for aggregate in &aggregates {
        groups
            .entry(aggregate.vegetable.as_str())
            .or_default()
            .push(aggregate.sales);
    }

    let stats: HashMap<String, GroupStats> = groups
        .into_iter()
        .filter_map(|(vegetable, values)| {
            GroupStats::from_values(&values).map(|s| (vegetable.to_string(), s))
        })
        .collect();

    for aggregate in &mut aggregates {
        aggregate.is_outlier = stats
            .get(&aggregate.vegetable)
            .is_some_and(|s| s.is_outlier(aggregate.sales));
    }

    aggregates
}
