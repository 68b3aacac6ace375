//! deal-signals: Rolling-window deal signals for alternative-asset prices
//!
//! This library provides the core components for:
//! - Loading raw listings from a Parquet warehouse
//! - Per-asset-class rolling mean and sample standard deviation
//! - Discount and z-score deal signals
//! - Reducing each run to one current record per asset class
//! - Atomic upserts into a SQLite signal store
//! - Slack notifications for new deals
//! - Logging and Prometheus metrics

pub mod cli;
pub mod config;
pub mod notify;
pub mod pipeline;
pub mod signal;
pub mod source;
pub mod store;
pub mod telemetry;
pub mod window;
