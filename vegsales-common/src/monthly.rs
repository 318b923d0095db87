//! Week-to-month allocation and monthly aggregation
//!
//! A week's quantity is split across the calendar months its seven days touch, in proportion
//! to the number of days in each month. Aggregation sums those contributions per
//! (year_month, vegetable).

use chrono::Duration;
use std::collections::BTreeMap;

use crate::calendar;
use crate::models::{MonthlyAggregate, SalesRecord};
use crate::Result;

/// Days in a `%W` week
const DAYS_PER_WEEK: u32 = 7;

/// Share of one weekly record attributed to one month
#[derive(Debug, Clone, PartialEq)]
pub struct MonthContribution {
    /// `YYYYMM`
    pub year_month: String,
    pub vegetable: String,
    pub sales: f64,
}

/// Allocate one weekly quantity across the months its days fall in
///
/// Returns one contribution for a week inside a single month, two for a week spanning a
/// month boundary. Contributions are ordered by month and always sum to `sales`.
pub fn allocate(year_week: i64, vegetable: &str, sales: f64) -> Result<Vec<MonthContribution>> {
    let start = calendar::week_start(year_week)?;

    let mut days_per_month: BTreeMap<String, u32> = BTreeMap::new();
    for offset in 0..DAYS_PER_WEEK {
        let day = start + Duration::days(i64::from(offset));
        *days_per_month.entry(calendar::year_month_key(day)).or_insert(0) += 1;
    }

    Ok(days_per_month
        .into_iter()
        .map(|(year_month, days)| MonthContribution {
            year_month,
            vegetable: vegetable.to_string(),
            sales: sales * f64::from(days) / f64::from(DAYS_PER_WEEK),
        })
        .collect())
}

/// Build the gold view from the full silver table
///
/// Output is ordered by (year_month, vegetable); `is_outlier` is left `false` for the tagger.
pub fn aggregate_monthly(records: &[SalesRecord]) -> Result<Vec<MonthlyAggregate>> {
    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();

    for record in records {
        for contribution in allocate(record.year_week, &record.vegetable, record.sales)? {
            *totals
                .entry((contribution.year_month, contribution.vegetable))
                .or_insert(0.0) += contribution.sales;
        }
    }

    Ok(totals
        .into_iter()
        .map(|((year_month, vegetable), sales)| MonthlyAggregate {
            year_month,
            vegetable,
            sales,
            is_outlier: false,
        })
        .collect())
}
