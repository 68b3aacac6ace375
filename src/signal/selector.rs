//! Latest-record selection
//!
//! Reduces a run's signal timeline to one current record per asset class.
//! The record with the greatest `observed_at` wins; when several share that
//! timestamp, the one offered last wins.

use super::SignalRecord;
use std::collections::BTreeMap;

/// Best-so-far reduction keyed by asset class
#[derive(Debug, Default)]
pub struct LatestSelector {
    latest: BTreeMap<String, SignalRecord>,
}

impl LatestSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a record; it replaces the current pick unless that pick is strictly newer
    pub fn offer(&mut self, record: SignalRecord) {
        match self.latest.get_mut(&record.asset_type) {
            Some(current) if current.observed_at > record.observed_at => {}
            Some(current) => *current = record,
            None => {
                self.latest.insert(record.asset_type.clone(), record);
            }
        }
    }

    /// Number of asset classes selected so far
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    /// Selected records ordered by asset class
    pub fn finish(self) -> Vec<SignalRecord> {
        self.latest.into_values().collect()
    }
}

/// Select the latest record per asset class from an arbitrary sequence
pub fn select_latest<I>(records: I) -> Vec<SignalRecord>
where
    I: IntoIterator<Item = SignalRecord>,
{
    let mut selector = LatestSelector::new();
    for record in records {
        selector.offer(record);
    }
    selector.finish()
}
