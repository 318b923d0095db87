//! Sales data models
//!
//! Internal rows (bronze/silver `SalesRecord`, gold `MonthlyAggregate`) and the external
//! shapes exchanged over HTTP (`RawSale`, `MonthlySale`).

use serde::{Deserialize, Serialize};

use crate::calendar;

/// Weekly sales row stored in the bronze and silver tables
///
/// Unique per (`year_week`, `vegetable`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// `year * 100 + week`
    pub year_week: i64,
    pub vegetable: String,
    pub sales: f64,
}

impl SalesRecord {
    pub fn new(year_week: i64, vegetable: impl Into<String>, sales: f64) -> Self {
        Self {
            year_week,
            vegetable: vegetable.into(),
            sales,
        }
    }

    /// Natural key of the row
    pub fn key(&self) -> (i64, &str) {
        (self.year_week, self.vegetable.as_str())
    }
}

/// Monthly aggregate stored in the gold table
///
/// Unique per (`year_month`, `vegetable`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAggregate {
    /// `YYYYMM`
    pub year_month: String,
    pub vegetable: String,
    pub sales: f64,
    pub is_outlier: bool,
}

/// External weekly record: `{"date": "YYYY-WW", "vegetable": ..., "kilo_sold": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSale {
    pub date: String,
    pub vegetable: String,
    pub kilo_sold: f64,
}

impl From<&SalesRecord> for RawSale {
    fn from(record: &SalesRecord) -> Self {
        Self {
            date: calendar::format_year_week(record.year_week),
            vegetable: record.vegetable.clone(),
            kilo_sold: record.sales,
        }
    }
}

/// External monthly record: `{"date": "YYYY-MM", "vegetable", "kilo_sold", "is_outlier"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySale {
    pub date: String,
    pub vegetable: String,
    pub kilo_sold: f64,
    pub is_outlier: bool,
}

impl From<&MonthlyAggregate> for MonthlySale {
    fn from(aggregate: &MonthlyAggregate) -> Self {
        Self {
            date: calendar::format_year_month(&aggregate.year_month),
            vegetable: aggregate.vegetable.clone(),
            kilo_sold: aggregate.sales,
            is_outlier: aggregate.is_outlier,
        }
    }
}
