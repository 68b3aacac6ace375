//! Signal store integration tests

use chrono::{Duration, Utc};
use deal_signals::signal::{DealPolicy, SignalRecord};
use deal_signals::store::{MemorySignalStore, SignalStore, SqliteSignalStore};
use std::sync::Arc;

fn record(asset_type: &str, price: f64, mean: f64, std: f64) -> SignalRecord {
    let verdict = DealPolicy::default().evaluate(price, Some(mean), Some(std));
    SignalRecord {
        asset_type: asset_type.to_string(),
        observed_at: Utc::now(),
        last_price: price,
        rolling_mean_30d: Some(mean),
        rolling_std_30d: Some(std),
        window_len: 30,
        verdict,
    }
}

async fn exercise(store: &dyn SignalStore) {
    let t0 = Utc::now();
    let batch = vec![
        record("watch", 40.0, 123.0, 14.0),
        record("wine", 545.0, 540.0, 6.0),
        record("private_jet", 8_900_000.0, 9_000_000.0, 40_000.0),
    ];

    let summary = store.upsert_batch(&batch, t0).await.unwrap();
    assert_eq!(summary.inserted, 3);
    assert_eq!(store.all().await.unwrap().len(), 3);

    let deals = store.deals().await.unwrap();
    let types: Vec<&str> = deals.iter().map(|d| d.asset_type.as_str()).collect();
    assert_eq!(types, vec!["private_jet", "watch"]);

    // Replaying the same batch only moves updated_at
    let t1 = t0 + Duration::minutes(10);
    let summary = store.upsert_batch(&batch, t1).await.unwrap();
    assert_eq!(summary.updated, 3);
    assert_eq!(summary.inserted, 0);

    let watch = store.get("watch").await.unwrap().unwrap();
    assert_eq!(watch.last_price, 40.0);
    assert_eq!(watch.updated_at.timestamp_micros(), t1.timestamp_micros());
    assert_eq!(store.all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_memory_store_contract() {
    exercise(&MemorySignalStore::new()).await;
}

#[tokio::test]
async fn test_sqlite_store_contract() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteSignalStore::open(dir.path().join("signals.db")).unwrap();
    exercise(&store).await;
}

#[tokio::test]
async fn test_concurrent_batches_keep_one_row_per_asset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("signals.db");
    // Separate connections contend on the database file lock
    let stores = [
        Arc::new(SqliteSignalStore::open(&path).unwrap()),
        Arc::new(SqliteSignalStore::open(&path).unwrap()),
    ];

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = Arc::clone(&stores[i as usize % 2]);
        handles.push(tokio::spawn(async move {
            let batch = vec![
                record("watch", 100.0 + i as f64, 110.0, 5.0),
                record("wine", 500.0 + i as f64, 540.0, 6.0),
            ];
            store
                .upsert_batch(&batch, Utc::now() + Duration::seconds(i))
                .await
        }));
    }
    for handle in handles {
        let summary = handle.await.unwrap().unwrap();
        assert_eq!(summary.written(), 2);
    }

    for store in &stores {
        assert_eq!(store.all().await.unwrap().len(), 2);
    }
}
