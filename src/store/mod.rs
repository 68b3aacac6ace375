//! Signal store module
//!
//! Keyed persistence for the current signal of each asset class

mod memory;
mod merge;
mod sqlite;

pub use memory::MemorySignalStore;
pub use merge::{merge_into, merge_record, to_row, MergeAction};
pub use sqlite::SqliteSignalStore;

use crate::signal::SignalRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted current signal for an asset class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSignal {
    /// Unique key
    pub asset_type: String,
    pub last_price: f64,
    pub rolling_mean_30d: f64,
    pub z_score: Option<f64>,
    pub is_deal: bool,
    /// When the row was last merged
    pub updated_at: DateTime<Utc>,
}

/// Counts from one batch merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    pub inserted: usize,
    pub updated: usize,
    /// Records not persisted because their window was incomplete
    pub skipped: usize,
}

impl MergeSummary {
    /// Rows written
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Signal store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Trait for signal store implementations
#[async_trait]
pub trait SignalStore: Send + Sync {
    /// Merge a batch of records atomically; either every row is written or none
    async fn upsert_batch(
        &self,
        records: &[SignalRecord],
        merged_at: DateTime<Utc>,
    ) -> Result<MergeSummary, StoreError>;

    /// Current row for an asset class
    async fn get(&self, asset_type: &str) -> Result<Option<StoredSignal>, StoreError>;

    /// Rows flagged as deals, most recently updated first
    async fn deals(&self) -> Result<Vec<StoredSignal>, StoreError>;

    /// All rows ordered by asset class
    async fn all(&self) -> Result<Vec<StoredSignal>, StoreError>;
}
