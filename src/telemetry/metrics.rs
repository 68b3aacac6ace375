//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Observations read from the source
    Observations,
    /// Rows dropped as malformed or out of order
    Dropped,
    /// Records flagged as deals
    Deals,
    /// Rows written to the signal store
    SignalsWritten,
    /// Notifications that failed to send
    NotifyFailures,
    /// Runs that failed
    RunFailures,
}

impl CounterMetric {
    pub fn name(&self) -> &'static str {
        match self {
            CounterMetric::Observations => "deal_signals_observations_total",
            CounterMetric::Dropped => "deal_signals_dropped_total",
            CounterMetric::Deals => "deal_signals_deals_total",
            CounterMetric::SignalsWritten => "deal_signals_written_total",
            CounterMetric::NotifyFailures => "deal_signals_notify_failures_total",
            CounterMetric::RunFailures => "deal_signals_run_failures_total",
        }
    }
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Whole pipeline run
    Run,
    /// Source fetch
    Fetch,
    /// Store merge
    Merge,
}

impl LatencyMetric {
    pub fn name(&self) -> &'static str {
        match self {
            LatencyMetric::Run => "deal_signals_run_duration_ms",
            LatencyMetric::Fetch => "deal_signals_fetch_duration_ms",
            LatencyMetric::Merge => "deal_signals_merge_duration_ms",
        }
    }
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Asset classes with a current record after the last run
    AssetClasses,
    /// Deals in the last run
    CurrentDeals,
}

impl GaugeMetric {
    pub fn name(&self) -> &'static str {
        match self {
            GaugeMetric::AssetClasses => "deal_signals_asset_classes",
            GaugeMetric::CurrentDeals => "deal_signals_current_deals",
        }
    }
}

/// Add to a counter
pub fn increment_counter(metric: CounterMetric, value: u64) {
    metrics::counter!(metric.name()).increment(value);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    let value_ms = duration.as_secs_f64() * 1000.0;
    metrics::histogram!(metric.name()).record(value_ms);
    tracing::debug!(metric = metric.name(), value_ms, "Recording latency");
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    metrics::gauge!(metric.name()).set(value);
}

/// Install the Prometheus recorder and serve `/metrics` on the given port
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics exporter: {}", e))?;
    tracing::info!(%addr, "Prometheus metrics exporter listening");
    Ok(())
}
