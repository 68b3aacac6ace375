//! Run command implementation

use crate::config::Config;
use crate::notify::{LogNotifier, Notifier, SlackNotifier};
use crate::pipeline::{Pipeline, PipelineError, RunReport};
use crate::source::WarehouseSource;
use crate::store::{MemorySignalStore, SignalStore, SqliteSignalStore};
use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Compute against an in-memory store and log deals instead of posting them
    #[arg(long)]
    pub dry_run: bool,

    /// Override the configured lookback window (days, 0 reads everything)
    #[arg(long)]
    pub lookback_days: Option<u32>,
}

impl RunArgs {
    /// Run the pipeline once; failures are folded into the report
    pub async fn execute(&self, config: &Config) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let pipeline = match self.build(config) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                tracing::error!(
                    %run_id,
                    class = %e.class(),
                    error = %e,
                    "Failed to start pipeline"
                );
                return RunReport::failed(run_id, started_at, &e);
            }
        };

        match pipeline.execute(run_id, started_at).await {
            Ok(report) => report,
            Err(e) => RunReport::failed(run_id, started_at, &e),
        }
    }

    fn build(&self, config: &Config) -> Result<Pipeline, PipelineError> {
        let warehouse = &config.source.warehouse_dir;
        if !warehouse.is_dir() {
            return Err(PipelineError::Config(format!(
                "warehouse directory not found: {}",
                warehouse.display()
            )));
        }
        let source = Arc::new(WarehouseSource::new(warehouse.clone()));

        let store: Arc<dyn SignalStore> = if self.dry_run {
            tracing::info!("Dry run, signals will not be persisted");
            Arc::new(MemorySignalStore::new())
        } else {
            let database = &config.store.database_path;
            if let Some(parent) = database.parent() {
                if !parent.as_os_str().is_empty() && !parent.is_dir() {
                    return Err(PipelineError::Config(format!(
                        "signal store directory not found: {}",
                        parent.display()
                    )));
                }
            }
            Arc::new(SqliteSignalStore::open(database)?)
        };

        let notifier: Arc<dyn Notifier> = if config.notify.enabled && !self.dry_run {
            Arc::new(SlackNotifier::from_env(&config.notify)?)
        } else {
            Arc::new(LogNotifier)
        };

        let mut pipeline = Pipeline::new(source, store, config).with_notifier(notifier);
        if let Some(days) = self.lookback_days {
            let lookback = (days > 0).then(|| Duration::days(i64::from(days)));
            pipeline = pipeline.with_lookback(lookback);
        }
        Ok(pipeline)
    }
}
