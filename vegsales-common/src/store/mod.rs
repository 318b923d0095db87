//! Persistence for the three pipeline tables
//!
//! - **bronze**: weekly records exactly as received
//! - **silver**: the same records with normalized vegetable names
//! - **gold**: monthly aggregates derived from silver, replaced wholesale
//!
//! Bronze and silver upserts are insert-or-ignore on (year_week, vegetable): the first write
//! of a key wins, later writes of the same key are no-ops. Within one batch the first
//! occurrence of a key wins as well.

mod csv_file;
mod sqlite;

pub use self::csv_file::CsvSalesStore;
pub use self::sqlite::SqliteSalesStore;

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::models::{MonthlyAggregate, SalesRecord};
use crate::{Error, Result};

/// Storage capability set shared by every backend
#[async_trait]
pub trait SalesStore: Send + Sync {
    /// Backend identifier for logging and health output
    fn backend(&self) -> StorageBackend;

    /// Insert-or-ignore weekly records into bronze; returns the number of new rows
    async fn upsert_bronze(&self, records: &[SalesRecord]) -> Result<usize>;

    /// Insert-or-ignore normalized weekly records into silver; returns the number of new rows
    async fn upsert_silver(&self, records: &[SalesRecord]) -> Result<usize>;

    /// Atomically replace the whole gold table
    async fn replace_gold(&self, aggregates: &[MonthlyAggregate]) -> Result<()>;

    async fn read_bronze(&self) -> Result<Vec<SalesRecord>>;

    async fn read_silver(&self) -> Result<Vec<SalesRecord>>;

    /// Gold snapshot, optionally without rows tagged as outliers
    async fn read_gold(&self, exclude_outliers: bool) -> Result<Vec<MonthlyAggregate>>;

    /// Empty all three tables, keeping their schema
    async fn reset(&self) -> Result<()>;
}

/// Open the configured backend, creating the data folder if needed
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn SalesStore>> {
    let data_dir = config.resolved_data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let store: Arc<dyn SalesStore> = match config.backend {
        StorageBackend::Sqlite => {
            Arc::new(SqliteSalesStore::open(&data_dir.join(SqliteSalesStore::FILE_NAME)).await?)
        }
        StorageBackend::Csv => Arc::new(CsvSalesStore::open(&data_dir)?),
    };

    info!(
        "Opened {} sales store in {}",
        store.backend(),
        data_dir.display()
    );
    Ok(store)
}

/// Check rows before they reach a table
///
/// Sales must be finite and vegetable names non-empty; anything else is a structural
/// validation error and nothing is written.
pub(crate) fn validate_records(records: &[SalesRecord]) -> Result<()> {
    for (index, record) in records.iter().enumerate() {
        if record.vegetable.trim().is_empty() {
            return Err(Error::Validation(format!(
                "Record {} has an empty vegetable name",
                index
            )));
        }
        if !record.sales.is_finite() {
            return Err(Error::Validation(format!(
                "Record {} has non-finite sales {}",
                index, record.sales
            )));
        }
    }
    Ok(())
}

/// Rows of `incoming` whose key is neither in `existing` nor earlier in `incoming`
pub(crate) fn new_records<'a>(
    existing: &[SalesRecord],
    incoming: &'a [SalesRecord],
) -> Vec<&'a SalesRecord> {
    let mut seen: HashSet<(i64, &str)> = existing.iter().map(SalesRecord::key).collect();
    incoming
        .iter()
        .filter(|record| seen.insert(record.key()))
        .collect()
}
