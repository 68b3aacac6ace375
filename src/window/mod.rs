//! Rolling window engine
//!
//! Per-asset-class bounded price history and windowed statistics

mod engine;
mod rolling;

pub use engine::WindowEngine;
pub use rolling::{RollingWindow, WindowStats};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Observations kept per asset class
pub const DEFAULT_CAPACITY: usize = 30;

/// Observations required before statistics are defined
pub const DEFAULT_MIN_PERIODS: usize = 5;

/// Errors raised while ingesting observations
#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    /// Observation is older than the last one ingested for its asset class
    #[error("observation at {timestamp} is older than last seen {last_seen}")]
    OutOfOrder {
        timestamp: DateTime<Utc>,
        last_seen: DateTime<Utc>,
    },
    /// Price is NaN or infinite
    #[error("non-finite price: {0}")]
    NonFinitePrice(f64),
    /// Price is zero or negative
    #[error("non-positive price: {0}")]
    NonPositivePrice(f64),
    /// Window parameters cannot produce a sample standard deviation
    #[error("invalid window config: {0}")]
    InvalidConfig(String),
}
