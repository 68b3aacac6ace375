//! Observation source module
//!
//! Loads raw listings from the warehouse and turns them into typed,
//! ordered price observations

mod parquet;
mod types;
mod warehouse;

pub use parquet::{listing_schema, read_listings, ListingReadout, ListingWriter};
pub use types::{extract_price, ParseError, PriceObservation, RawListing};
pub use warehouse::{MemorySource, WarehouseSource};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Observations for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    /// Observations ordered by `(asset_type, timestamp)`
    pub observations: Vec<PriceObservation>,
    /// Rows dropped before reaching the engine
    pub dropped: usize,
}

impl SourceBatch {
    /// Stable sort by asset class, then timestamp; equal timestamps keep load order
    pub fn sort(&mut self) {
        self.observations.sort_by(|a, b| {
            a.asset_type
                .cmp(&b.asset_type)
                .then(a.timestamp.cmp(&b.timestamp))
        });
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Trait for observation source implementations
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Fetch observations at or after `since`, sorted per asset class
    async fn fetch(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<SourceBatch>;
}
