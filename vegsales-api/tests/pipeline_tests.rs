//! Pipeline tests with concurrent ingests
//!
//! Two ingests racing on the same (year_week, vegetable) key must leave exactly one row in
//! bronze and silver, and gold must agree with whichever value won.

use std::sync::Arc;

use tempfile::TempDir;
use vegsales_api::Pipeline;
use vegsales_common::config::{StorageBackend, StorageConfig};
use vegsales_common::models::RawSale;
use vegsales_common::store::{open_store, SqliteSalesStore};

/// Test helper: a pipeline per backend, with the temp folders that must outlive them
async fn all_pipelines() -> Vec<(TempDir, Arc<Pipeline>)> {
    let mut pipelines = Vec::new();

    let memory = SqliteSalesStore::in_memory().await.unwrap();
    pipelines.push((TempDir::new().unwrap(), Arc::new(Pipeline::new(Arc::new(memory)))));

    for backend in [StorageBackend::Sqlite, StorageBackend::Csv] {
        let dir = TempDir::new().unwrap();
        let store = open_store(&StorageConfig {
            backend,
            data_dir: Some(dir.path().to_path_buf()),
        })
        .await
        .unwrap();
        pipelines.push((dir, Arc::new(Pipeline::new(store))));
    }

    pipelines
}

fn sale(date: &str, vegetable: &str, kilo_sold: f64) -> RawSale {
    RawSale {
        date: date.to_string(),
        vegetable: vegetable.to_string(),
        kilo_sold,
    }
}

async fn assert_single_consistent_row(pipeline: &Pipeline) {
    let backend = pipeline.store().backend();

    let bronze = pipeline.store().read_bronze().await.unwrap();
    assert_eq!(bronze.len(), 1, "{}: bronze rows {:?}", backend, bronze);
    let winner = bronze[0].sales;
    assert!(winner == 70.0 || winner == 140.0, "{}: torn value {}", backend, winner);

    let silver = pipeline.store().read_silver().await.unwrap();
    assert_eq!(silver.len(), 1, "{}: silver rows {:?}", backend, silver);
    assert_eq!(silver[0].vegetable, "tomato");
    assert_eq!(silver[0].sales, winner);

    // 2020 week 4 runs Jan 27 to Feb 2
    let monthly = pipeline.monthly_sales(false).await.unwrap();
    assert_eq!(monthly.len(), 2, "{}: gold rows {:?}", backend, monthly);
    assert!((monthly[0].kilo_sold - winner * 5.0 / 7.0).abs() < 1e-9);
    assert!((monthly[1].kilo_sold - winner * 2.0 / 7.0).abs() < 1e-9);
    let total: f64 = monthly.iter().map(|m| m.kilo_sold).sum();
    assert!((total - winner).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_joined_ingests_on_one_key_converge() {
    for (_dir, pipeline) in all_pipelines().await {
        let first = [sale("2020-04", "tomate", 70.0)];
        let second = [sale("2020-04", "tomate", 140.0)];

        let (a, b) = tokio::join!(pipeline.ingest(&first), pipeline.ingest(&second));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.bronze_inserted + b.bronze_inserted, 1);
        assert_eq!(a.silver_inserted + b.silver_inserted, 1);
        assert_single_consistent_row(&pipeline).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_spawned_ingests_with_synonyms_converge() {
    for (_dir, pipeline) in all_pipelines().await {
        // Different raw names that normalize to the same silver key
        let tasks: Vec<_> = [("tomate", 70.0), ("Tomatoes", 140.0)]
            .into_iter()
            .map(|(name, kilo)| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move { pipeline.ingest(&[sale("2020-04", name, kilo)]).await })
            })
            .collect();

        let mut silver_inserted = 0;
        for task in tasks {
            silver_inserted += task.await.unwrap().unwrap().silver_inserted;
        }
        assert_eq!(silver_inserted, 1);

        let raw = pipeline.raw_sales().await.unwrap();
        assert_eq!(raw.len(), 2, "both raw spellings stay in bronze");

        let silver = pipeline.store().read_silver().await.unwrap();
        assert_eq!(silver.len(), 1);
        let monthly = pipeline.monthly_sales(false).await.unwrap();
        let total: f64 = monthly.iter().map(|m| m.kilo_sold).sum();
        assert!((total - silver[0].sales).abs() < 1e-9);
    }
}
