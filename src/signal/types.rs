//! Signal types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of applying the deal policy to one price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalVerdict {
    /// Standardized distance from the rolling mean; undefined without a positive std
    pub z_score: Option<f64>,
    /// Price at or below the discounted rolling mean
    pub discount_signal: bool,
    /// Z-score at or below the threshold
    pub z_score_signal: bool,
    /// Either signal fired
    pub is_deal: bool,
}

impl SignalVerdict {
    /// Verdict when no statistics are available
    pub fn none() -> Self {
        Self {
            z_score: None,
            discount_signal: false,
            z_score_signal: false,
            is_deal: false,
        }
    }
}

/// Signal derived for a single observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Asset class (e.g., "watch", "wine", "private_jet")
    pub asset_type: String,
    /// Timestamp of the observation the signal was derived from
    pub observed_at: DateTime<Utc>,
    /// Observed price
    pub last_price: f64,
    /// Rolling mean including this observation
    pub rolling_mean_30d: Option<f64>,
    /// Rolling sample standard deviation including this observation
    pub rolling_std_30d: Option<f64>,
    /// Observations in the window
    pub window_len: usize,
    #[serde(flatten)]
    pub verdict: SignalVerdict,
}

impl SignalRecord {
    pub fn is_deal(&self) -> bool {
        self.verdict.is_deal
    }

    pub fn z_score(&self) -> Option<f64> {
        self.verdict.z_score
    }

    /// Window had enough observations for statistics
    pub fn is_complete(&self) -> bool {
        self.rolling_mean_30d.is_some()
    }
}
