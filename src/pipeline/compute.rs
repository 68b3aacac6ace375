//! Core signal computation: window engine, deal policy and latest-record selection

use crate::config::WindowConfig;
use crate::signal::{DealPolicy, LatestSelector, SignalRecord};
use crate::source::PriceObservation;
use crate::window::{WindowEngine, WindowError};

/// Result of one compute pass
#[derive(Debug, Clone, Default)]
pub struct ComputeOutcome {
    /// Current record per asset class, ordered by asset class
    pub records: Vec<SignalRecord>,
    /// Observations that produced a signal
    pub evaluated: usize,
    /// Observations older than the last one seen for their asset class
    pub out_of_order: usize,
    /// Observations the window refused for any other reason
    pub rejected: usize,
}

/// Run every observation through its asset class window and reduce the
/// resulting signals to one current record per asset class.
///
/// Observations must already be ordered by timestamp within each asset
/// class; stragglers are skipped and counted rather than failing the pass.
pub fn compute_signals(
    observations: &[PriceObservation],
    window: WindowConfig,
    policy: &DealPolicy,
) -> Result<ComputeOutcome, WindowError> {
    let mut engine = WindowEngine::new(window)?;
    let mut selector = LatestSelector::new();
    let mut outcome = ComputeOutcome::default();

    for observation in observations {
        let stats = match engine.ingest(observation) {
            Ok(stats) => stats,
            Err(e @ WindowError::OutOfOrder { .. }) => {
                tracing::warn!(
                    asset_type = %observation.asset_type,
                    error = %e,
                    "Skipping observation"
                );
                outcome.out_of_order += 1;
                continue;
            }
            Err(e @ (WindowError::NonFinitePrice(_) | WindowError::NonPositivePrice(_))) => {
                tracing::warn!(
                    asset_type = %observation.asset_type,
                    error = %e,
                    "Skipping observation"
                );
                outcome.rejected += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let verdict = policy.evaluate_stats(observation.price, &stats);
        selector.offer(SignalRecord {
            asset_type: observation.asset_type.clone(),
            observed_at: observation.timestamp,
            last_price: observation.price,
            rolling_mean_30d: stats.mean(),
            rolling_std_30d: stats.sample_std(),
            window_len: stats.count(),
            verdict,
        });
        outcome.evaluated += 1;
    }

    outcome.records = selector.finish();

    tracing::debug!(
        asset_classes = engine.len(),
        evaluated = outcome.evaluated,
        out_of_order = outcome.out_of_order,
        "Computed signals"
    );

    Ok(outcome)
}
