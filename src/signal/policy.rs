//! Deal threshold policy

use super::SignalVerdict;
use crate::config::SignalConfig;
use crate::window::WindowStats;

/// Discount ratio applied to the rolling mean
pub const DEFAULT_DISCOUNT_RATIO: f64 = 0.9;

/// Z-score at or below which a price is a deal
pub const DEFAULT_Z_SCORE_THRESHOLD: f64 = -2.0;

/// Converts a price and its rolling statistics into a deal verdict
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DealPolicy {
    pub discount_ratio: f64,
    pub z_score_threshold: f64,
}

impl Default for DealPolicy {
    fn default() -> Self {
        Self {
            discount_ratio: DEFAULT_DISCOUNT_RATIO,
            z_score_threshold: DEFAULT_Z_SCORE_THRESHOLD,
        }
    }
}

impl From<&SignalConfig> for DealPolicy {
    fn from(config: &SignalConfig) -> Self {
        Self {
            discount_ratio: config.discount_ratio,
            z_score_threshold: config.z_score_threshold,
        }
    }
}

impl DealPolicy {
    /// Evaluate a price against possibly-undefined mean and std
    pub fn evaluate(&self, price: f64, mean: Option<f64>, std: Option<f64>) -> SignalVerdict {
        let discount_signal = mean.is_some_and(|m| price <= m * self.discount_ratio);

        let z_score = match (mean, std) {
            (Some(m), Some(s)) if s > 0.0 => Some((price - m) / s),
            _ => None,
        };
        let z_score_signal = z_score.is_some_and(|z| z <= self.z_score_threshold);

        SignalVerdict {
            z_score,
            discount_signal,
            z_score_signal,
            is_deal: discount_signal || z_score_signal,
        }
    }

    /// Evaluate a price against window statistics
    pub fn evaluate_stats(&self, price: f64, stats: &WindowStats) -> SignalVerdict {
        match stats {
            WindowStats::Ready {
                mean, sample_std, ..
            } => self.evaluate(price, Some(*mean), Some(*sample_std)),
            WindowStats::Insufficient { .. } => SignalVerdict::none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_stats_is_never_a_deal() {
        let policy = DealPolicy::default();
        let verdict = policy.evaluate(1.0, None, None);
        assert_eq!(verdict, SignalVerdict::none());

        let verdict = policy.evaluate_stats(1.0, &WindowStats::Insufficient { count: 4 });
        assert!(!verdict.is_deal);
        assert!(verdict.z_score.is_none());
    }

    #[test]
    fn test_discount_boundary_is_inclusive() {
        let policy = DealPolicy::default();
        let verdict = policy.evaluate(90.0, Some(100.0), Some(50.0));
        assert!(verdict.discount_signal);
        assert!(!verdict.z_score_signal);
        assert!(verdict.is_deal);

        let verdict = policy.evaluate(90.01, Some(100.0), Some(50.0));
        assert!(!verdict.discount_signal);
        assert!(!verdict.is_deal);
    }

    #[test]
    fn test_z_score_signal_alone() {
        let policy = DealPolicy::default();
        // 95 is above the 90 discount line but two stds below the mean
        let verdict = policy.evaluate(95.0, Some(100.0), Some(2.5));
        assert_eq!(verdict.z_score, Some(-2.0));
        assert!(verdict.z_score_signal);
        assert!(!verdict.discount_signal);
        assert!(verdict.is_deal);
    }

    #[test]
    fn test_zero_std_leaves_z_undefined() {
        let policy = DealPolicy::default();
        let verdict = policy.evaluate(80.0, Some(100.0), Some(0.0));
        assert!(verdict.z_score.is_none());
        assert!(!verdict.z_score_signal);
        assert!(verdict.discount_signal);
        assert!(verdict.is_deal);
    }

    #[test]
    fn test_truth_table() {
        let policy = DealPolicy::default();
        let mean = 100.0;
        let std = 4.0;
        for price in [70.0, 89.0, 90.0, 91.0, 92.0, 95.0, 100.0, 130.0] {
            let verdict = policy.evaluate(price, Some(mean), Some(std));
            let z = (price - mean) / std;
            let expected = price <= mean * 0.9 || z <= -2.0;
            assert_eq!(verdict.is_deal, expected, "price {}", price);
        }
    }

    #[test]
    fn test_thresholds_are_overridable() {
        let config = SignalConfig {
            discount_ratio: 0.5,
            z_score_threshold: -10.0,
        };
        let policy = DealPolicy::from(&config);
        let verdict = policy.evaluate(60.0, Some(100.0), Some(10.0));
        assert!(!verdict.is_deal);
        let verdict = policy.evaluate(50.0, Some(100.0), Some(10.0));
        assert!(verdict.discount_signal);
    }
}
