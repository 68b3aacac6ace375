//! SQLite signal store
//!
//! One row per asset class in the `signals` table. A batch is applied inside
//! a single `BEGIN IMMEDIATE` transaction, and each row is written with
//! `INSERT ... ON CONFLICT(asset_type) DO UPDATE`, so concurrent runs never
//! interleave partial batches and a failure leaves the table untouched.

use super::{to_row, MergeAction, MergeSummary, SignalStore, StoreError, StoredSignal};
use crate::signal::SignalRecord;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS signals (
    asset_type       TEXT PRIMARY KEY,
    last_price       REAL NOT NULL CHECK (last_price > 0),
    rolling_mean_30d REAL NOT NULL,
    z_score          REAL,
    is_deal          INTEGER NOT NULL,
    updated_at       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_signals_deal_updated ON signals (is_deal, updated_at DESC);
"#;

const UPSERT: &str = r#"
INSERT INTO signals (asset_type, last_price, rolling_mean_30d, z_score, is_deal, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(asset_type) DO UPDATE SET
    last_price = excluded.last_price,
    rolling_mean_30d = excluded.rolling_mean_30d,
    z_score = excluded.z_score,
    is_deal = excluded.is_deal,
    updated_at = excluded.updated_at
"#;

const COLUMNS: &str = "asset_type, last_price, rolling_mean_30d, z_score, is_deal, updated_at";

/// SQLite-backed implementation of SignalStore
pub struct SqliteSignalStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSignalStore {
    /// Open (creating if needed) a database file and ensure the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Self::init(conn)
    }

    /// In-memory database, for tests and dry runs
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("Signal store schema ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut *guard)
        })
        .await?
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<StoredSignal> {
    let updated_at: String = row.get(5)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);
    Ok(StoredSignal {
        asset_type: row.get(0)?,
        last_price: row.get(1)?,
        rolling_mean_30d: row.get(2)?,
        z_score: row.get(3)?,
        is_deal: row.get(4)?,
        updated_at,
    })
}

fn query_rows(conn: &Connection, sql: &str) -> Result<Vec<StoredSignal>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[async_trait]
impl SignalStore for SqliteSignalStore {
    async fn upsert_batch(
        &self,
        records: &[SignalRecord],
        merged_at: DateTime<Utc>,
    ) -> Result<MergeSummary, StoreError> {
        let records = records.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut summary = MergeSummary::default();
            let updated_at = format_ts(merged_at);

            for record in &records {
                let Some(row) = to_row(record, merged_at) else {
                    summary.record(MergeAction::Skipped);
                    continue;
                };

                let exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM signals WHERE asset_type = ?1)",
                    [&row.asset_type],
                    |r| r.get(0),
                )?;

                tx.execute(
                    UPSERT,
                    params![
                        row.asset_type,
                        row.last_price,
                        row.rolling_mean_30d,
                        row.z_score,
                        row.is_deal,
                        updated_at,
                    ],
                )?;

                summary.record(if exists {
                    MergeAction::Updated
                } else {
                    MergeAction::Inserted
                });
            }

            tx.commit()?;
            Ok(summary)
        })
        .await
    }

    async fn get(&self, asset_type: &str) -> Result<Option<StoredSignal>, StoreError> {
        let asset_type = asset_type.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {} FROM signals WHERE asset_type = ?1", COLUMNS),
                    [&asset_type],
                    read_row,
                )
                .optional()?;
            Ok(row)
        })
        .await
    }

    async fn deals(&self) -> Result<Vec<StoredSignal>, StoreError> {
        self.with_conn(|conn| {
            query_rows(
                conn,
                &format!(
                    "SELECT {} FROM signals WHERE is_deal = 1 \
                     ORDER BY updated_at DESC, asset_type ASC",
                    COLUMNS
                ),
            )
        })
        .await
    }

    async fn all(&self) -> Result<Vec<StoredSignal>, StoreError> {
        self.with_conn(|conn| {
            query_rows(
                conn,
                &format!("SELECT {} FROM signals ORDER BY asset_type ASC", COLUMNS),
            )
        })
        .await
    }
}
