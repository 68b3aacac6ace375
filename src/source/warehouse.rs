//! Observation source backed by the Parquet listing warehouse

use super::parquet::{read_listings, LISTINGS_PREFIX};
use super::{ObservationSource, PriceObservation, SourceBatch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Reads every `listings_*.parquet` file in a directory
pub struct WarehouseSource {
    dir: PathBuf,
}

impl WarehouseSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Listing files in name order
    pub fn listing_files(&self) -> anyhow::Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                let is_parquet = path.extension().and_then(|e| e.to_str()) == Some("parquet");
                let is_listing = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(LISTINGS_PREFIX));
                is_parquet && is_listing
            })
            .collect();
        files.sort();
        Ok(files)
    }

    fn load(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<SourceBatch> {
        if !self.dir.is_dir() {
            anyhow::bail!("Warehouse directory not found: {}", self.dir.display());
        }

        let mut batch = SourceBatch::default();
        let files = self.listing_files()?;

        for path in &files {
            let readout = read_listings(path, since)?;
            batch.dropped += readout.malformed;

            for listing in readout.listings {
                match listing.to_observation() {
                    Ok(observation) => batch.observations.push(observation),
                    Err(e) => {
                        tracing::debug!(
                            asset_type = %listing.asset_type,
                            error = %e,
                            "Dropping listing"
                        );
                        batch.dropped += 1;
                    }
                }
            }
        }

        batch.sort();

        tracing::info!(
            files = files.len(),
            observations = batch.observations.len(),
            dropped = batch.dropped,
            "Loaded observations from warehouse"
        );

        Ok(batch)
    }
}

#[async_trait]
impl ObservationSource for WarehouseSource {
    async fn fetch(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<SourceBatch> {
        let source = WarehouseSource::new(self.dir.clone());
        tokio::task::spawn_blocking(move || source.load(since)).await?
    }
}

/// Observations held in memory, for tests and replays
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    observations: Vec<PriceObservation>,
}

impl MemorySource {
    pub fn new(observations: Vec<PriceObservation>) -> Self {
        Self { observations }
    }
}

#[async_trait]
impl ObservationSource for MemorySource {
    async fn fetch(&self, since: Option<DateTime<Utc>>) -> anyhow::Result<SourceBatch> {
        let mut batch = SourceBatch {
            observations: self
                .observations
                .iter()
                .filter(|o| since.map_or(true, |cutoff| o.timestamp >= cutoff))
                .cloned()
                .collect(),
            dropped: 0,
        };
        batch.sort();
        Ok(batch)
    }
}
