//! Pipeline orchestration
//!
//! Ingest and reset take the write lock for their whole duration, so concurrent requests never
//! interleave bronze, silver and gold writes. Reads go straight to the store.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};
use vegsales_common::calendar;
use vegsales_common::models::{MonthlySale, RawSale};
use vegsales_common::monthly::aggregate_monthly;
use vegsales_common::normalize::normalize;
use vegsales_common::outliers::tag_outliers;
use vegsales_common::{Result, SalesRecord, SalesStore};

use super::validation::validate_batch;

/// Row counts produced by one ingest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Records in the submitted batch
    pub received: usize,
    /// New bronze rows (duplicates of existing keys are dropped)
    pub bronze_inserted: usize,
    /// New silver rows
    pub silver_inserted: usize,
    /// Size of the recomputed gold table
    pub gold_rows: usize,
}

/// Medallion pipeline over a storage backend
pub struct Pipeline {
    store: Arc<dyn SalesStore>,
    write_lock: Mutex<()>,
}

impl Pipeline {
    pub fn new(store: Arc<dyn SalesStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn SalesStore> {
        &self.store
    }

    /// Validate a decoded JSON body and ingest it
    pub async fn ingest_json(&self, payload: &Value) -> Result<IngestSummary> {
        let batch = validate_batch(payload)?;
        self.ingest(&batch).await
    }

    /// Ingest a batch of weekly records
    ///
    /// Every label is parsed before anything is written. Bronze keeps the vegetable name as
    /// submitted; silver stores the normalized name; gold is recomputed from all of silver.
    pub async fn ingest(&self, batch: &[RawSale]) -> Result<IngestSummary> {
        let bronze = batch
            .iter()
            .map(|sale| {
                let year_week = calendar::parse_date_label(&sale.date)?;
                Ok(SalesRecord::new(year_week, sale.vegetable.clone(), sale.kilo_sold))
            })
            .collect::<Result<Vec<_>>>()?;

        let silver: Vec<SalesRecord> = bronze
            .iter()
            .map(|record| SalesRecord::new(record.year_week, normalize(&record.vegetable), record.sales))
            .collect();

        let _guard = self.write_lock.lock().await;

        let bronze_inserted = self.store.upsert_bronze(&bronze).await?;
        let silver_inserted = self.store.upsert_silver(&silver).await?;
        let gold_rows = self.rebuild_gold().await?;

        let summary = IngestSummary {
            received: batch.len(),
            bronze_inserted,
            silver_inserted,
            gold_rows,
        };
        info!(
            "Ingested batch: {} received, {} bronze, {} silver, {} gold rows",
            summary.received, summary.bronze_inserted, summary.silver_inserted, summary.gold_rows
        );
        Ok(summary)
    }

    /// Recompute the gold table from the full silver table
    async fn rebuild_gold(&self) -> Result<usize> {
        let silver = self.store.read_silver().await?;
        let gold = tag_outliers(aggregate_monthly(&silver)?);

        let outliers = gold.iter().filter(|row| row.is_outlier).count();
        debug!("Rebuilt gold from {} silver rows: {} monthly rows, {} outliers", silver.len(), gold.len(), outliers);

        self.store.replace_gold(&gold).await?;
        Ok(gold.len())
    }

    /// Drop all data from every layer
    pub async fn reset(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.reset().await?;
        info!("Sales data reset ({} backend)", self.store.backend());
        Ok(())
    }

    /// Bronze rows in insertion order
    pub async fn raw_sales(&self) -> Result<Vec<RawSale>> {
        let rows = self.store.read_bronze().await?;
        Ok(rows.iter().map(RawSale::from).collect())
    }

    /// Gold rows, optionally without the outliers
    pub async fn monthly_sales(&self, exclude_outliers: bool) -> Result<Vec<MonthlySale>> {
        let rows = self.store.read_gold(exclude_outliers).await?;
        Ok(rows.iter().map(MonthlySale::from).collect())
    }
}
