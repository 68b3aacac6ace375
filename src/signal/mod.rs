//! Signal derivation module
//!
//! Turns rolling statistics into deal verdicts and picks the current
//! record per asset class

mod policy;
mod selector;
mod types;

pub use policy::{DealPolicy, DEFAULT_DISCOUNT_RATIO, DEFAULT_Z_SCORE_THRESHOLD};
pub use selector::{select_latest, LatestSelector};
pub use types::{SignalRecord, SignalVerdict};
