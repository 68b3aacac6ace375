//! Bounded rolling window with O(1) mean / sample standard deviation

use super::WindowError;
use crate::config::WindowConfig;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Statistics for the current contents of a window
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowStats {
    /// Fewer observations than the configured minimum; mean and std are undefined
    Insufficient { count: usize },
    /// Enough observations for meaningful statistics
    Ready {
        mean: f64,
        sample_std: f64,
        count: usize,
    },
}

impl WindowStats {
    /// Number of observations in the window
    pub fn count(&self) -> usize {
        match *self {
            WindowStats::Insufficient { count } => count,
            WindowStats::Ready { count, .. } => count,
        }
    }

    /// Rolling mean, if defined
    pub fn mean(&self) -> Option<f64> {
        match *self {
            WindowStats::Ready { mean, .. } => Some(mean),
            WindowStats::Insufficient { .. } => None,
        }
    }

    /// Unbiased (n-1) standard deviation, if defined
    pub fn sample_std(&self) -> Option<f64> {
        match *self {
            WindowStats::Ready { sample_std, .. } => Some(sample_std),
            WindowStats::Insufficient { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, WindowStats::Ready { .. })
    }
}

/// Count-bounded FIFO of prices for a single asset class
///
/// Running sums are kept relative to a shift value (the buffer mean at the
/// last resync) so the sum-of-squares stays small for prices far from zero.
/// Every `capacity` evictions the sums are rebuilt from the buffer, which
/// bounds accumulated round-off without giving up amortized O(1) ingest.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    capacity: usize,
    min_periods: usize,
    entries: VecDeque<(DateTime<Utc>, f64)>,
    shift: f64,
    sum: f64,
    sum_sq: f64,
    evictions_since_resync: usize,
}

impl RollingWindow {
    /// Create an empty window. The config is expected to be validated.
    pub fn new(config: &WindowConfig) -> Self {
        Self {
            capacity: config.capacity,
            min_periods: config.min_periods,
            entries: VecDeque::with_capacity(config.capacity + 1),
            shift: 0.0,
            sum: 0.0,
            sum_sq: 0.0,
            evictions_since_resync: 0,
        }
    }

    /// Append an observation, evicting the oldest once capacity is exceeded.
    ///
    /// Observations must arrive in non-decreasing timestamp order; an older
    /// timestamp is rejected and leaves the window untouched.
    pub fn push(&mut self, timestamp: DateTime<Utc>, price: f64) -> Result<(), WindowError> {
        if !price.is_finite() {
            return Err(WindowError::NonFinitePrice(price));
        }
        if price <= 0.0 {
            return Err(WindowError::NonPositivePrice(price));
        }
        if let Some(&(last, _)) = self.entries.back() {
            if timestamp < last {
                return Err(WindowError::OutOfOrder {
                    timestamp,
                    last_seen: last,
                });
            }
        }

        if self.entries.is_empty() {
            self.shift = price;
            self.sum = 0.0;
            self.sum_sq = 0.0;
        }

        let d = price - self.shift;
        self.entries.push_back((timestamp, price));
        self.sum += d;
        self.sum_sq += d * d;

        if self.entries.len() > self.capacity {
            if let Some((_, old)) = self.entries.pop_front() {
                let d = old - self.shift;
                self.sum -= d;
                self.sum_sq -= d * d;
                self.evictions_since_resync += 1;
            }
        }

        if self.evictions_since_resync >= self.capacity {
            self.resync();
        }

        Ok(())
    }

    /// Rebuild the running sums exactly from the buffered prices
    fn resync(&mut self) {
        let n = self.entries.len().max(1) as f64;
        self.shift = self.prices().sum::<f64>() / n;
        self.sum = 0.0;
        self.sum_sq = 0.0;
        for &(_, price) in &self.entries {
            let d = price - self.shift;
            self.sum += d;
            self.sum_sq += d * d;
        }
        self.evictions_since_resync = 0;
    }

    /// Current statistics
    pub fn snapshot(&self) -> WindowStats {
        let count = self.entries.len();
        if count < self.min_periods || count < 2 {
            return WindowStats::Insufficient { count };
        }

        let n = count as f64;
        let mean = self.shift + self.sum / n;

        // Deviations within round-off of the accumulated sums are a flat window
        let deviation_sq = self.sum_sq - self.sum * self.sum / n;
        let noise_floor = 8.0 * n * f64::EPSILON * self.sum_sq;
        let variance = if deviation_sq <= noise_floor {
            0.0
        } else {
            deviation_sq / (n - 1.0)
        };

        WindowStats::Ready {
            mean,
            sample_std: variance.sqrt(),
            count,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Timestamp of the most recent observation
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.back().map(|&(ts, _)| ts)
    }

    /// Buffered prices, oldest first
    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|&(_, p)| p)
    }
}
