//! Pipeline module
//!
//! One run: fetch observations, compute signals, merge them into the
//! store, then notify on deals

mod compute;
mod error;

pub use compute::{compute_signals, ComputeOutcome};
pub use error::{ErrorClass, PipelineError};

use crate::config::{Config, WindowConfig};
use crate::notify::Notifier;
use crate::signal::DealPolicy;
use crate::source::ObservationSource;
use crate::store::{to_row, SignalStore};
use crate::telemetry::{
    increment_counter, record_latency, set_gauge, CounterMetric, GaugeMetric, LatencyMetric,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// Final state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    /// Observations fetched from the source
    pub observations: usize,
    /// Rows dropped as malformed, at the source or by the window
    pub dropped: usize,
    pub out_of_order: usize,
    /// Current records produced, one per asset class
    pub signals_processed: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Records not persisted because their window was incomplete
    pub skipped: usize,
    pub deals: usize,
    pub notify_failures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    fn new(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            status: RunStatus::Success,
            started_at,
            observations: 0,
            dropped: 0,
            out_of_order: 0,
            signals_processed: 0,
            inserted: 0,
            updated: 0,
            skipped: 0,
            deals: 0,
            notify_failures: 0,
            error_class: None,
            error: None,
        }
    }

    /// Report for a run that failed before completing
    pub fn failed(run_id: Uuid, started_at: DateTime<Utc>, error: &PipelineError) -> Self {
        Self {
            status: RunStatus::Failed,
            error_class: Some(error.class()),
            error: Some(error.to_string()),
            ..Self::new(run_id, started_at)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Wires a source, a store and an optional notifier around the signal core
pub struct Pipeline {
    source: Arc<dyn ObservationSource>,
    store: Arc<dyn SignalStore>,
    notifier: Option<Arc<dyn Notifier>>,
    window: WindowConfig,
    policy: DealPolicy,
    lookback: Option<Duration>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn ObservationSource>,
        store: Arc<dyn SignalStore>,
        config: &Config,
    ) -> Self {
        let lookback = match config.source.lookback_days {
            0 => None,
            days => Some(Duration::days(i64::from(days))),
        };
        Self {
            source,
            store,
            notifier: None,
            window: config.window,
            policy: DealPolicy::from(&config.signal),
            lookback,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Override the trailing window of observations fetched; `None` fetches everything
    pub fn with_lookback(mut self, lookback: Option<Duration>) -> Self {
        self.lookback = lookback;
        self
    }

    /// Run once with a fresh run id
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        self.execute(Uuid::new_v4(), Utc::now()).await
    }

    /// Run once; `now` anchors the lookback cutoff and stamps merged rows
    pub async fn execute(
        &self,
        run_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RunReport, PipelineError> {
        let span = tracing::info_span!("pipeline_run", %run_id);
        let started = Instant::now();

        let result = self.execute_inner(run_id, now).instrument(span).await;
        record_latency(LatencyMetric::Run, started.elapsed());

        match &result {
            Ok(report) => {
                tracing::info!(
                    %run_id,
                    signals = report.signals_processed,
                    deals = report.deals,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Pipeline run complete"
                );
            }
            Err(e) => {
                increment_counter(CounterMetric::RunFailures, 1);
                tracing::error!(%run_id, class = %e.class(), error = %e, "Pipeline run failed");
            }
        }
        result
    }

    async fn execute_inner(
        &self,
        run_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::new(run_id, now);
        let since = self.lookback.map(|lookback| now - lookback);

        let fetch_started = Instant::now();
        let batch = self
            .source
            .fetch(since)
            .await
            .map_err(PipelineError::source_failure)?;
        record_latency(LatencyMetric::Fetch, fetch_started.elapsed());

        report.observations = batch.observations.len();
        report.dropped = batch.dropped;
        increment_counter(CounterMetric::Observations, report.observations as u64);

        if batch.is_empty() {
            increment_counter(CounterMetric::Dropped, report.dropped as u64);
            tracing::info!(dropped = report.dropped, "No observations in window, nothing to merge");
            return Ok(report);
        }

        let outcome = compute_signals(&batch.observations, self.window, &self.policy)?;
        report.out_of_order = outcome.out_of_order;
        report.dropped += outcome.rejected;
        report.signals_processed = outcome.records.len();
        increment_counter(
            CounterMetric::Dropped,
            (report.dropped + report.out_of_order) as u64,
        );

        let merge_started = Instant::now();
        let summary = self.store.upsert_batch(&outcome.records, now).await?;
        record_latency(LatencyMetric::Merge, merge_started.elapsed());

        report.inserted = summary.inserted;
        report.updated = summary.updated;
        report.skipped = summary.skipped;
        increment_counter(CounterMetric::SignalsWritten, summary.written() as u64);

        // Only rows that were actually persisted are announced
        let deals: Vec<_> = outcome
            .records
            .iter()
            .filter(|r| r.is_deal())
            .filter_map(|r| to_row(r, now))
            .collect();
        report.deals = deals.len();
        increment_counter(CounterMetric::Deals, deals.len() as u64);
        set_gauge(GaugeMetric::CurrentDeals, deals.len() as f64);
        set_gauge(GaugeMetric::AssetClasses, report.signals_processed as f64);

        if let Some(notifier) = &self.notifier {
            for deal in &deals {
                if let Err(e) = notifier.notify(deal).await {
                    tracing::warn!(
                        asset_type = %deal.asset_type,
                        error = %e,
                        "Deal notification failed"
                    );
                    report.notify_failures += 1;
                }
            }
            increment_counter(CounterMetric::NotifyFailures, report.notify_failures as u64);
        }

        Ok(report)
    }
}
