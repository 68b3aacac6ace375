//! Ingest command implementation

use crate::config::Config;
use crate::source::{ListingWriter, RawListing};
use clap::Args;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON Lines file of captured listings
    #[arg(short, long)]
    pub input: PathBuf,

    /// Warehouse directory (defaults to the configured one)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Listings parsed from a capture file
#[derive(Debug, Default)]
pub struct Capture {
    pub listings: Vec<RawListing>,
    pub malformed: usize,
}

/// Parse a JSON Lines capture, skipping blank and malformed lines
pub fn read_capture(path: &Path) -> anyhow::Result<Capture> {
    let file = std::fs::File::open(path)?;
    let mut capture = Capture::default();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawListing>(&line) {
            Ok(listing) => capture.listings.push(listing),
            Err(e) => {
                tracing::warn!(line = index + 1, error = %e, "Skipping malformed capture line");
                capture.malformed += 1;
            }
        }
    }

    Ok(capture)
}

impl IngestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let input = self.input.clone();
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| config.source.warehouse_dir.clone());

        let (written, capture) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let capture = read_capture(&input)?;
            let writer = ListingWriter::new(output);
            let written = writer.write(&capture.listings)?;
            Ok((written, capture))
        })
        .await??;

        match written {
            Some(path) => tracing::info!(
                listings = capture.listings.len(),
                malformed = capture.malformed,
                path = %path.display(),
                "Ingested listings"
            ),
            None => tracing::info!(malformed = capture.malformed, "No listings to ingest"),
        }

        println!(
            "Ingested {} listings ({} malformed lines skipped)",
            capture.listings.len(),
            capture.malformed
        );
        Ok(())
    }
}
