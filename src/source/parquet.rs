//! Parquet storage for raw listings

use super::RawListing;
use arrow::array::{Array, ArrayRef, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name prefix for listing files in the warehouse directory
pub const LISTINGS_PREFIX: &str = "listings";

/// Listing schema fields
pub fn listing_schema() -> Schema {
    Schema::new(vec![
        Field::new("asset_type", DataType::Utf8, false),
        Field::new("source_api", DataType::Utf8, false),
        Field::new(
            "ingestion_timestamp",
            DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
            false,
        ),
        Field::new("raw_data", DataType::Utf8, false), // Provider JSON, verbatim
    ])
}

/// Writes listing batches into timestamped Parquet files
pub struct ListingWriter {
    output_dir: PathBuf,
}

impl ListingWriter {
    /// Create a new writer for a warehouse directory
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Ensure output directory exists
    pub fn ensure_dir(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }

    /// Generate file path for a given timestamp
    pub fn file_path(&self, timestamp: DateTime<Utc>) -> PathBuf {
        let filename = format!(
            "{}_{}.parquet",
            LISTINGS_PREFIX,
            timestamp.format("%Y%m%d_%H%M%S_%6f")
        );
        self.output_dir.join(filename)
    }

    /// Write listings to a new file. Returns `None` when there is nothing to write.
    pub fn write(&self, listings: &[RawListing]) -> anyhow::Result<Option<PathBuf>> {
        if listings.is_empty() {
            return Ok(None);
        }

        let path = self.file_path(Utc::now());
        self.write_to(&path, listings)?;
        Ok(Some(path))
    }

    /// Write listings to an explicit path
    pub fn write_to(&self, path: &Path, listings: &[RawListing]) -> anyhow::Result<()> {
        if listings.is_empty() {
            return Ok(());
        }

        self.ensure_dir()?;

        let schema = Arc::new(listing_schema());
        let file = File::create(path)?;

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        let asset_types: Vec<&str> = listings.iter().map(|l| l.asset_type.as_str()).collect();
        let sources: Vec<&str> = listings.iter().map(|l| l.source_api.as_str()).collect();
        let timestamps: Vec<i64> = listings
            .iter()
            .map(|l| l.ingestion_timestamp.timestamp_micros())
            .collect();
        let payloads: Vec<String> = listings.iter().map(|l| l.raw_data.to_string()).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(asset_types)) as ArrayRef,
                Arc::new(StringArray::from(sources)) as ArrayRef,
                Arc::new(TimestampMicrosecondArray::from(timestamps).with_timezone("UTC"))
                    as ArrayRef,
                Arc::new(StringArray::from(
                    payloads.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
                )) as ArrayRef,
            ],
        )?;

        writer.write(&batch)?;
        writer.close()?;

        tracing::debug!(path = ?path, count = listings.len(), "Wrote listings to Parquet");

        Ok(())
    }
}

/// Listings read from one file
#[derive(Debug, Default)]
pub struct ListingReadout {
    pub listings: Vec<RawListing>,
    /// Rows with null columns or unparseable JSON payloads
    pub malformed: usize,
}

/// Read listings ingested at or after `since` from a Parquet file
pub fn read_listings(path: &Path, since: Option<DateTime<Utc>>) -> anyhow::Result<ListingReadout> {
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let reader = builder.build()?;

    let mut readout = ListingReadout::default();

    for batch_result in reader {
        let batch = batch_result?;

        let asset_types = string_column(&batch, "asset_type")?;
        let sources = string_column(&batch, "source_api")?;
        let payloads = string_column(&batch, "raw_data")?;
        let timestamps = batch
            .column_by_name("ingestion_timestamp")
            .and_then(|c| c.as_any().downcast_ref::<TimestampMicrosecondArray>())
            .ok_or_else(|| anyhow::anyhow!("Invalid ingestion_timestamp column"))?;

        for i in 0..batch.num_rows() {
            if asset_types.is_null(i)
                || sources.is_null(i)
                || payloads.is_null(i)
                || timestamps.is_null(i)
            {
                readout.malformed += 1;
                continue;
            }

            let Some(ingestion_timestamp) = DateTime::from_timestamp_micros(timestamps.value(i))
            else {
                readout.malformed += 1;
                continue;
            };
            if since.is_some_and(|cutoff| ingestion_timestamp < cutoff) {
                continue;
            }

            let raw_data = match serde_json::from_str(payloads.value(i)) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(
                        path = ?path,
                        row = i,
                        error = %e,
                        "Skipping listing with bad payload"
                    );
                    readout.malformed += 1;
                    continue;
                }
            };

            readout.listings.push(RawListing {
                asset_type: asset_types.value(i).to_string(),
                source_api: sources.value(i).to_string(),
                ingestion_timestamp,
                raw_data,
            });
        }
    }

    Ok(readout)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| anyhow::anyhow!("Invalid {} column", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use tempfile::TempDir;

    fn listing(asset_type: &str, at: DateTime<Utc>, raw_data: serde_json::Value) -> RawListing {
        RawListing {
            asset_type: asset_type.to_string(),
            source_api: "watchcharts".to_string(),
            ingestion_timestamp: at,
            raw_data,
        }
    }

    #[test]
    fn test_listing_schema() {
        let schema = listing_schema();
        assert_eq!(schema.fields().len(), 4);
        assert_eq!(schema.field(0).name(), "asset_type");
        assert_eq!(schema.field(2).name(), "ingestion_timestamp");
        assert_eq!(schema.field(3).name(), "raw_data");
    }

    #[test]
    fn test_file_path() {
        let writer = ListingWriter::new(PathBuf::from("/warehouse"));
        let timestamp = DateTime::parse_from_rfc3339("2025-01-04T12:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let path = writer.file_path(timestamp);
        assert_eq!(
            path,
            PathBuf::from("/warehouse/listings_20250104_123000_000000.parquet")
        );
    }

    #[test]
    fn test_write_and_read_listings() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ListingWriter::new(temp_dir.path().to_path_buf());

        let now = DateTime::from_timestamp_micros(Utc::now().timestamp_micros()).unwrap();
        let listings = vec![
            listing("watch", now, json!({"price": 12500.0, "model": "Submariner"})),
            listing("watch", now, json!({"price": "12600"})),
        ];

        let path = writer.write(&listings).unwrap().unwrap();
        let readout = read_listings(&path, None).unwrap();

        assert_eq!(readout.malformed, 0);
        assert_eq!(readout.listings, listings);
    }

    #[test]
    fn test_read_filters_by_cutoff() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ListingWriter::new(temp_dir.path().to_path_buf());

        let now = Utc::now();
        let listings = vec![
            listing("wine", now - Duration::days(40), json!({"price": 500})),
            listing("wine", now - Duration::days(3), json!({"price": 510})),
        ];
        let path = writer.write(&listings).unwrap().unwrap();

        let readout = read_listings(&path, Some(now - Duration::days(35))).unwrap();
        assert_eq!(readout.listings.len(), 1);
        assert_eq!(readout.listings[0].raw_data, json!({"price": 510}));
    }

    #[test]
    fn test_write_empty_listings() {
        let temp_dir = TempDir::new().unwrap();
        let writer = ListingWriter::new(temp_dir.path().join("nested"));
        assert!(writer.write(&[]).unwrap().is_none());
        assert!(!temp_dir.path().join("nested").exists());
    }

    #[test]
    fn test_read_missing_file() {
        assert!(read_listings(Path::new("/nonexistent/listings.parquet"), None).is_err());
    }
}
