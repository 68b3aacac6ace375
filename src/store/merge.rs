//! Upsert merge policy
//!
//! Last-writer-wins keyed by asset class. A record replaces every value
//! column of the stored row and stamps `updated_at` with the merge time, so
//! re-applying the same record changes nothing but `updated_at`. Records
//! whose window never filled are not persisted.

use super::{MergeSummary, StoredSignal};
use crate::signal::SignalRecord;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// What the merge did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    Inserted,
    Updated,
    Skipped,
}

impl MergeSummary {
    /// Count one merge action
    pub fn record(&mut self, action: MergeAction) {
        match action {
            MergeAction::Inserted => self.inserted += 1,
            MergeAction::Updated => self.updated += 1,
            MergeAction::Skipped => self.skipped += 1,
        }
    }
}

/// Row to persist for a record, or `None` if its statistics are incomplete
pub fn to_row(record: &SignalRecord, merged_at: DateTime<Utc>) -> Option<StoredSignal> {
    let rolling_mean_30d = record.rolling_mean_30d?;
    Some(StoredSignal {
        asset_type: record.asset_type.clone(),
        last_price: record.last_price,
        rolling_mean_30d,
        z_score: record.z_score(),
        is_deal: record.is_deal(),
        updated_at: merged_at,
    })
}

/// Merge one record into a keyed table
pub fn merge_record(
    table: &mut BTreeMap<String, StoredSignal>,
    record: &SignalRecord,
    merged_at: DateTime<Utc>,
) -> MergeAction {
    let Some(row) = to_row(record, merged_at) else {
        return MergeAction::Skipped;
    };

    match table.insert(row.asset_type.clone(), row) {
        Some(_) => MergeAction::Updated,
        None => MergeAction::Inserted,
    }
}

/// Merge a batch of records into a keyed table in order
pub fn merge_into(
    table: &mut BTreeMap<String, StoredSignal>,
    records: &[SignalRecord],
    merged_at: DateTime<Utc>,
) -> MergeSummary {
    let mut summary = MergeSummary::default();
    for record in records {
        summary.record(merge_record(table, record, merged_at));
    }
    summary
}
