//! # Vegetable Sales Common Library
//!
//! Shared code for the vegetable sales pipeline including:
//! - Sales record models (bronze/silver rows, gold monthly aggregates)
//! - Vegetable name normalization
//! - Week-number calendar codec and week-to-month allocation
//! - Outlier tagging
//! - Storage backends (SQLite, CSV)
//! - Configuration loading

pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod monthly;
pub mod normalize;
pub mod outliers;
pub mod store;

pub use error::{Error, Result};
pub use models::{MonthlyAggregate, SalesRecord};
pub use store::SalesStore;
