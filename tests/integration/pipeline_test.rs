//! End-to-end pipeline tests: warehouse Parquet in, SQLite signals out

use chrono::{Duration, Utc};
use deal_signals::config::Config;
use deal_signals::pipeline::Pipeline;
use deal_signals::source::{ListingWriter, RawListing, WarehouseSource};
use deal_signals::store::{SignalStore, SqliteSignalStore};
use serde_json::json;
use std::sync::Arc;

fn listing(
    asset_type: &str,
    source_api: &str,
    hours_ago: i64,
    price: serde_json::Value,
) -> RawListing {
    RawListing {
        asset_type: asset_type.to_string(),
        source_api: source_api.to_string(),
        ingestion_timestamp: Utc::now() - Duration::hours(hours_ago),
        raw_data: json!({ "price": price, "title": "listing" }),
    }
}

fn watch_listings() -> Vec<RawListing> {
    let mut listings: Vec<RawListing> = (0..30)
        .map(|i| {
            let price = 100.0 + 50.0 * i as f64 / 29.0;
            listing("watch", "watchcharts", 100 - i, json!(price))
        })
        .collect();
    listings.push(listing("watch", "watchcharts", 1, json!(40.0)));
    listings
}

fn wine_listings() -> Vec<RawListing> {
    (0..35)
        .map(|i| {
            let price = format!("{:.2}", 100.0 + 10.0 * i as f64 / 34.0);
            listing("wine", "liv-ex", 200 - i, json!(price))
        })
        .collect()
}

#[tokio::test]
async fn test_warehouse_to_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = dir.path().join("warehouse");
    let writer = ListingWriter::new(warehouse.clone());

    writer.write(&watch_listings()).unwrap();
    // Distinct file names; the writer names files by wall-clock time
    let wine_path = writer.file_path(Utc::now() + Duration::seconds(1));
    let mut wine = wine_listings();
    wine.push(listing("wine", "liv-ex", 300, json!(null)));
    wine.push(listing("wine", "liv-ex", 300, json!("n/a")));
    writer.write_to(&wine_path, &wine).unwrap();

    let store = Arc::new(SqliteSignalStore::open(dir.path().join("signals.db")).unwrap());
    let pipeline = Pipeline::new(
        Arc::new(WarehouseSource::new(warehouse)),
        store.clone(),
        &Config::default(),
    );

    let report = pipeline.run().await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.observations, 66);
    assert_eq!(report.dropped, 2);
    assert_eq!(report.signals_processed, 2);
    assert_eq!(report.inserted, 2);
    assert_eq!(report.deals, 1);

    let watch = store.get("watch").await.unwrap().unwrap();
    assert!(watch.is_deal);
    assert_eq!(watch.last_price, 40.0);

    let wine = store.get("wine").await.unwrap().unwrap();
    assert!(!wine.is_deal);
    assert!(wine.z_score.unwrap() > -2.0);

    let deals = store.deals().await.unwrap();
    assert_eq!(deals.len(), 1);
    assert_eq!(deals[0].asset_type, "watch");
}

#[tokio::test]
async fn test_second_run_updates_rows() {
    let dir = tempfile::tempdir().unwrap();
    let warehouse = dir.path().join("warehouse");
    ListingWriter::new(warehouse.clone())
        .write(&wine_listings())
        .unwrap();

    let store = Arc::new(SqliteSignalStore::open(dir.path().join("signals.db")).unwrap());
    let pipeline = Pipeline::new(
        Arc::new(WarehouseSource::new(warehouse)),
        store.clone(),
        &Config::default(),
    );

    let first = pipeline.run().await.unwrap();
    let before = store.get("wine").await.unwrap().unwrap();
    let second = pipeline.run().await.unwrap();
    let after = store.get("wine").await.unwrap().unwrap();

    assert_eq!(first.inserted, 1);
    assert_eq!(second.updated, 1);
    assert_eq!(before.last_price, after.last_price);
    assert_eq!(before.rolling_mean_30d, after.rolling_mean_30d);
    assert!(after.updated_at >= before.updated_at);
}

#[tokio::test]
async fn test_empty_warehouse_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteSignalStore::open(dir.path().join("signals.db")).unwrap());
    let pipeline = Pipeline::new(
        Arc::new(WarehouseSource::new(dir.path().to_path_buf())),
        store.clone(),
        &Config::default(),
    );

    let report = pipeline.run().await.unwrap();
    assert!(report.is_success());
    assert_eq!(report.observations, 0);
    assert!(store.all().await.unwrap().is_empty());
}
