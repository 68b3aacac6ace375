//! In-memory signal store

use super::{merge_into, MergeSummary, SignalStore, StoreError, StoredSignal};
use crate::signal::SignalRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Signal table held in memory; a batch merge runs under one write lock
#[derive(Debug, Clone, Default)]
pub struct MemorySignalStore {
    rows: Arc<RwLock<BTreeMap<String, StoredSignal>>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl SignalStore for MemorySignalStore {
    async fn upsert_batch(
        &self,
        records: &[SignalRecord],
        merged_at: DateTime<Utc>,
    ) -> Result<MergeSummary, StoreError> {
        let mut rows = self.rows.write().await;
        Ok(merge_into(&mut rows, records, merged_at))
    }

    async fn get(&self, asset_type: &str) -> Result<Option<StoredSignal>, StoreError> {
        Ok(self.rows.read().await.get(asset_type).cloned())
    }

    async fn deals(&self) -> Result<Vec<StoredSignal>, StoreError> {
        let rows = self.rows.read().await;
        let mut deals: Vec<StoredSignal> = rows.values().filter(|r| r.is_deal).cloned().collect();
        deals.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.asset_type.cmp(&b.asset_type))
        });
        Ok(deals)
    }

    async fn all(&self) -> Result<Vec<StoredSignal>, StoreError> {
        Ok(self.rows.read().await.values().cloned().collect())
    }
}
