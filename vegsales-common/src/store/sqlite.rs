//! SQLite-backed sales store
//!
//! Each table carries a UNIQUE constraint on its natural key. Upserts run `INSERT OR IGNORE`
//! inside one transaction per call, and the gold replacement is a single transaction, so
//! readers only ever see the previous or the new gold snapshot.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::{validate_records, SalesStore};
use crate::config::StorageBackend;
use crate::models::{MonthlyAggregate, SalesRecord};
use crate::Result;

const BRONZE_TABLE: &str = "bronze_sales";
const SILVER_TABLE: &str = "silver_sales";
const GOLD_TABLE: &str = "gold_sales";

/// Sales store over a SQLite connection pool
#[derive(Clone)]
pub struct SqliteSalesStore {
    pool: SqlitePool,
}

impl SqliteSalesStore {
    /// Database file name inside the data folder
    pub const FILE_NAME: &'static str = "sales.db";

    /// How long a connection waits for another writer before failing
    pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    /// Open (or create) the database file and ensure the schema exists
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Applied per connection: WAL lets readers proceed while the single writer commits
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(
                SqliteConnectOptions::new()
                    .filename(db_path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
                    .busy_timeout(Self::BUSY_TIMEOUT),
            )
            .await?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        Self::with_pool(pool).await
    }

    /// Private in-memory database (one connection, kept for the pool's lifetime)
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::with_pool(pool).await
    }

    /// Wrap an existing pool, creating tables if they don't exist
    pub async fn with_pool(pool: SqlitePool) -> Result<Self> {
        create_tables(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn insert_or_ignore(&self, table: &str, records: &[SalesRecord]) -> Result<usize> {
        validate_records(records)?;

        let sql = format!(
            "INSERT OR IGNORE INTO {} (year_week, vegetable, sales) VALUES (?, ?, ?)",
            table
        );

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;
        for record in records {
            let result = sqlx::query(&sql)
                .bind(record.year_week)
                .bind(&record.vegetable)
                .bind(record.sales)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected() as usize;
        }
        tx.commit().await?;

        debug!(table, received = records.len(), inserted, "Upserted weekly records");
        Ok(inserted)
    }

    async fn read_weekly(&self, table: &str) -> Result<Vec<SalesRecord>> {
        let sql = format!(
            "SELECT year_week, vegetable, sales FROM {} ORDER BY id",
            table
        );
        let rows: Vec<(i64, String, f64)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(year_week, vegetable, sales)| SalesRecord {
                year_week,
                vegetable,
                sales,
            })
            .collect())
    }
}

async fn create_tables(pool: &SqlitePool) -> Result<()> {
    for table in [BRONZE_TABLE, SILVER_TABLE] {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                year_week INTEGER NOT NULL,
                vegetable TEXT NOT NULL,
                sales REAL NOT NULL,
                UNIQUE(year_week, vegetable)
            )
            "#,
            table
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year_month TEXT NOT NULL,
            vegetable TEXT NOT NULL,
            sales REAL NOT NULL,
            is_outlier INTEGER NOT NULL DEFAULT 0,
            UNIQUE(year_month, vegetable)
        )
        "#,
        GOLD_TABLE
    ))
    .execute(pool)
    .await?;

    debug!("Sales tables initialized (bronze, silver, gold)");
    Ok(())
}

#[async_trait]
impl SalesStore for SqliteSalesStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    async fn upsert_bronze(&self, records: &[SalesRecord]) -> Result<usize> {
        self.insert_or_ignore(BRONZE_TABLE, records).await
    }

    async fn upsert_silver(&self, records: &[SalesRecord]) -> Result<usize> {
        self.insert_or_ignore(SILVER_TABLE, records).await
    }

    async fn replace_gold(&self, aggregates: &[MonthlyAggregate]) -> Result<()> {
        let insert_sql = format!(
            "INSERT INTO {} (year_month, vegetable, sales, is_outlier) VALUES (?, ?, ?, ?)",
            GOLD_TABLE
        );

        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("DELETE FROM {}", GOLD_TABLE))
            .execute(&mut *tx)
            .await?;
        for aggregate in aggregates {
            sqlx::query(&insert_sql)
                .bind(&aggregate.year_month)
                .bind(&aggregate.vegetable)
                .bind(aggregate.sales)
                .bind(aggregate.is_outlier)
                .execute(&mut *tx)
                .await?;
        }
        // Dropping the transaction on any error above rolls back to the previous snapshot
        tx.commit().await?;

        debug!(rows = aggregates.len(), "Replaced gold table");
        Ok(())
    }

    async fn read_bronze(&self) -> Result<Vec<SalesRecord>> {
        self.read_weekly(BRONZE_TABLE).await
    }

    async fn read_silver(&self) -> Result<Vec<SalesRecord>> {
        self.read_weekly(SILVER_TABLE).await
    }

    async fn read_gold(&self, exclude_outliers: bool) -> Result<Vec<MonthlyAggregate>> {
        let filter = if exclude_outliers {
            " WHERE is_outlier = 0"
        } else {
            ""
        };
        let sql = format!(
            "SELECT year_month, vegetable, sales, is_outlier FROM {}{} ORDER BY id",
            GOLD_TABLE, filter
        );
        let rows: Vec<(String, String, f64, bool)> =
            sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(year_month, vegetable, sales, is_outlier)| MonthlyAggregate {
                year_month,
                vegetable,
                sales,
                is_outlier,
            })
            .collect())
    }

    async fn reset(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for table in [BRONZE_TABLE, SILVER_TABLE, GOLD_TABLE] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        info!("Sales tables reset");
        Ok(())
    }
}
