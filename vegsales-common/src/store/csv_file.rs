//! Flat-file sales store: one CSV file per table
//!
//! Writes are staged to a dot-prefixed `.tmp` sibling and renamed over the target, so a
//! reader sees either the old or the new file. Missing or blank files are read as empty
//! tables, so a freshly created data folder behaves like an initialized one. A file with
//! unparseable rows is an error on both reads and writes; `reset` rewrites it.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{new_records, validate_records, SalesStore};
use crate::config::StorageBackend;
use crate::models::{MonthlyAggregate, SalesRecord};
use crate::Result;

const WEEKLY_HEADERS: [&str; 3] = ["year_week", "vegetable", "sales"];
const MONTHLY_HEADERS: [&str; 4] = ["year_month", "vegetable", "sales", "is_outlier"];

/// Sales store over `bronze_sales.csv`, `silver_sales.csv` and `gold_sales.csv`
pub struct CsvSalesStore {
    dir: PathBuf,
    /// Readers share, writers exclude
    lock: RwLock<()>,
}

impl CsvSalesStore {
    pub const BRONZE_FILE: &'static str = "bronze_sales.csv";
    pub const SILVER_FILE: &'static str = "silver_sales.csv";
    pub const GOLD_FILE: &'static str = "gold_sales.csv";

    /// Use `dir` as the table folder, creating it if missing
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            lock: RwLock::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    fn table_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    async fn upsert(&self, file_name: &str, records: &[SalesRecord]) -> Result<usize> {
        validate_records(records)?;

        let _guard = self.lock.write().await;
        let path = self.table_path(file_name);

        let mut rows: Vec<SalesRecord> = read_table(&path)?;
        let fresh: Vec<SalesRecord> = new_records(&rows, records).into_iter().cloned().collect();
        let inserted = fresh.len();

        if inserted > 0 {
            rows.extend(fresh);
            write_table(&path, &WEEKLY_HEADERS, &rows)?;
        }

        debug!(table = file_name, received = records.len(), inserted, "Upserted weekly records");
        Ok(inserted)
    }
}

/// Read every row of a table file
///
/// A missing or blank file is a table that was never written and reads as empty. Rows that
/// fail to parse are an error, so a damaged table is never mistaken for an empty one and
/// overwritten.
fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read(path)?;
    if content.iter().all(u8::is_ascii_whitespace) {
        warn!("Blank table file {} treated as empty", path.display());
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_reader(content.as_slice());
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()?;
    Ok(rows)
}

/// Write header + rows to a temp file, then rename it over `path`
fn write_table<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&temp_path)?;
        writer.write_record(headers)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
    }

    std::fs::rename(&temp_path, path)?;
    Ok(())
}

#[async_trait]
impl SalesStore for CsvSalesStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Csv
    }

    async fn upsert_bronze(&self, records: &[SalesRecord]) -> Result<usize> {
        self.upsert(Self::BRONZE_FILE, records).await
    }

    async fn upsert_silver(&self, records: &[SalesRecord]) -> Result<usize> {
        self.upsert(Self::SILVER_FILE, records).await
    }

    async fn replace_gold(&self, aggregates: &[MonthlyAggregate]) -> Result<()> {
        let _guard = self.lock.write().await;
        write_table(&self.table_path(Self::GOLD_FILE), &MONTHLY_HEADERS, aggregates)?;

        debug!(rows = aggregates.len(), "Replaced gold table");
        Ok(())
    }

    async fn read_bronze(&self) -> Result<Vec<SalesRecord>> {
        let _guard = self.lock.read().await;
        read_table(&self.table_path(Self::BRONZE_FILE))
    }

    async fn read_silver(&self) -> Result<Vec<SalesRecord>> {
        let _guard = self.lock.read().await;
        read_table(&self.table_path(Self::SILVER_FILE))
    }

    async fn read_gold(&self, exclude_outliers: bool) -> Result<Vec<MonthlyAggregate>> {
        let _guard = self.lock.read().await;
        let mut rows: Vec<MonthlyAggregate> = read_table(&self.table_path(Self::GOLD_FILE))?;
        if exclude_outliers {
            rows.retain(|row| !row.is_outlier);
        }
        Ok(rows)
    }

    async fn reset(&self) -> Result<()> {
        let _guard = self.lock.write().await;
        write_table::<SalesRecord>(&self.table_path(Self::BRONZE_FILE), &WEEKLY_HEADERS, &[])?;
        write_table::<SalesRecord>(&self.table_path(Self::SILVER_FILE), &WEEKLY_HEADERS, &[])?;
        write_table::<MonthlyAggregate>(&self.table_path(Self::GOLD_FILE), &MONTHLY_HEADERS, &[])?;

        info!("Sales tables reset in {}", self.dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_corrupt_row_fails_upsert_and_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvSalesStore::open(dir.path()).unwrap();
        store
            .upsert_bronze(&[
                SalesRecord::new(202001, "tomate", 1.0),
                SalesRecord::new(202002, "pear", 2.0),
            ])
            .await
            .unwrap();

        let path = dir.path().join(CsvSalesStore::BRONZE_FILE);
        let mut damaged = std::fs::read_to_string(&path).unwrap();
        damaged.push_str("202003,onion,oops\n");
        std::fs::write(&path, &damaged).unwrap();

        let result = store
            .upsert_bronze(&[SalesRecord::new(202010, "kale", 1.0)])
            .await;

        assert!(matches!(result, Err(crate::Error::Csv(_))), "got {:?}", result);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), damaged);
    }

    #[tokio::test]
    async fn test_corrupt_file_read_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvSalesStore::open(dir.path()).unwrap();
        std::fs::write(
            dir.path().join(CsvSalesStore::BRONZE_FILE),
            "year_week,vegetable,sales\nnot-a-number,tomato,abc\n",
        )
        .unwrap();

        assert!(store.read_bronze().await.is_err());

        // Reset recovers a damaged folder
        store.reset().await.unwrap();
        assert!(store.read_bronze().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvSalesStore::open(dir.path()).unwrap();

        assert!(store.read_silver().await.unwrap().is_empty());
        assert!(!dir.path().join(CsvSalesStore::SILVER_FILE).exists());
    }

    #[tokio::test]
    async fn test_empty_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvSalesStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join(CsvSalesStore::GOLD_FILE), "").unwrap();

        assert!(store.read_gold(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_writes_headers_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvSalesStore::open(dir.path()).unwrap();
        store
            .upsert_bronze(&[SalesRecord::new(202001, "tomate", 1.0)])
            .await
            .unwrap();

        store.reset().await.unwrap();

        let bronze = std::fs::read_to_string(dir.path().join(CsvSalesStore::BRONZE_FILE)).unwrap();
        assert_eq!(bronze.trim_end(), "year_week,vegetable,sales");
        let gold = std::fs::read_to_string(dir.path().join(CsvSalesStore::GOLD_FILE)).unwrap();
        assert_eq!(gold.trim_end(), "year_month,vegetable,sales,is_outlier");
    }

    #[tokio::test]
    async fn test_writes_leave_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvSalesStore::open(dir.path()).unwrap();
        store
            .upsert_silver(&[SalesRecord::new(202001, "tomato", 1.0)])
            .await
            .unwrap();
        store.replace_gold(&[]).await.unwrap();

        let leftovers: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "Leftover temp files: {:?}", leftovers);
    }

    #[tokio::test]
    async fn test_gold_year_month_survives_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvSalesStore::open(dir.path()).unwrap();
        let gold = vec![MonthlyAggregate {
            year_month: "202001".to_string(),
            vegetable: "tomato".to_string(),
            sales: 100.0,
            is_outlier: true,
        }];

        store.replace_gold(&gold).await.unwrap();

        assert_eq!(store.read_gold(false).await.unwrap(), gold);
        assert!(store.read_gold(true).await.unwrap().is_empty());
    }
}
