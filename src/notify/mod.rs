//! Deal notification module

mod slack;

pub use slack::{
    display_asset_type, fallback_text, format_deal_message, format_money, round_cents,
    SlackNotifier, SLACK_API_URL,
};

use crate::store::StoredSignal;
use async_trait::async_trait;
use thiserror::Error;

/// Notification errors
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification token not set (env var {0})")]
    MissingToken(String),
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
}

/// Delivers a persisted deal to some outside channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, signal: &StoredSignal) -> Result<(), NotifyError>;
}

/// Writes deals to the log instead of an external service
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, signal: &StoredSignal) -> Result<(), NotifyError> {
        tracing::info!(
            asset_type = %signal.asset_type,
            last_price = signal.last_price,
            rolling_mean_30d = signal.rolling_mean_30d,
            z_score = ?signal.z_score,
            "Deal signal"
        );
        Ok(())
    }
}
