//! SQLite-backed store for normalized report records, the download ledger and
//! persisted daily prices.
//!
//! The store is the single source of truth and the resumability checkpoint of the
//! pipeline. Every bulk write runs inside one `BEGIN IMMEDIATE` transaction, so a
//! concurrent reader sees either none or all of an upsert.
//!
//! Cross-process exclusivity of writers is not handled here; the pipeline lock owns
//! that. Readers may open their own [`CotStore`] at any time.

mod ledger;
mod prices;
mod queries;

pub use prices::StoredPrices;

use anyhow::Context;
use cot_ingestor::models::record::NormalizedRecord;
use cot_ingestor::models::report::{UnknownCodeError, Variant};
use diesel::prelude::*;
use diesel::SqliteConnection;
use serde::Serialize;
use tracing::{debug, info};

use crate::db::{connection::connect_sqlite, migrate};
use crate::models::CotRecordRow;
use crate::schema::{cot_records, download_ledger};

#[derive(thiserror::Error, Debug)]
/// Errors that can occur while mapping stored rows back to domain records.
pub enum StoreError {
    /// A stored report or sub-type code is not recognised.
    #[error("corrupt stored row: {0}")]
    UnknownCode(#[from] UnknownCodeError),
}

/// Result type used throughout the store.
pub type StoreResult<T> = anyhow::Result<T>;

/// Distinct market within a variant, described by its newest row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketInfo {
    pub code: String,
    pub name: String,
    pub exchange_code: String,
    pub commodity_code: String,
}

/// One market and its newest-first series.
#[derive(Debug, Clone)]
pub struct MarketSeries {
    pub market: MarketInfo,
    pub records: Vec<NormalizedRecord>,
}

/// Row counts and date range for a variant, a report type, or the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantStats {
    pub total_records: i64,
    pub total_markets: i64,
    pub total_periods: i64,
    pub first_date: Option<chrono::NaiveDate>,
    pub last_date: Option<chrono::NaiveDate>,
}

/// Handle on the report database.
pub struct CotStore {
    conn: SqliteConnection,
    path: String,
}

impl CotStore {
    /// Opens (creating if needed) the database at `path` and applies pending migrations.
    pub fn open(path: &str) -> StoreResult<Self> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }
        let mut conn = connect_sqlite(path).with_context(|| format!("opening {path}"))?;
        migrate::run_pending(&mut conn)?;
        Ok(Self {
            conn,
            path: path.to_string(),
        })
    }

    /// Filesystem path of the database.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Direct access for maintenance and tests.
    pub fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Inserts or replaces `records` by natural key, atomically.
    ///
    /// Safe to repeat with overlapping input: the last write for a key wins.
    pub fn upsert(&mut self, records: &[NormalizedRecord]) -> StoreResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let rows: Vec<CotRecordRow> = records.iter().map(CotRecordRow::from).collect();

        let written = self
            .conn
            .immediate_transaction::<_, anyhow::Error, _>(|conn| {
                let mut written = 0;
                for row in &rows {
                    written += diesel::replace_into(cot_records::table)
                        .values(row)
                        .execute(conn)?;
                }
                Ok(written)
            })?;
        debug!(rows = written, "upserted records");
        Ok(written)
    }

    /// Removes every record and ledger entry of `variant`, in one transaction.
    pub fn delete_variant(&mut self, variant: Variant) -> StoreResult<usize> {
        let rt = variant.report_type.code();
        let st = variant.sub_type.code();
        let deleted = self
            .conn
            .immediate_transaction::<_, anyhow::Error, _>(|conn| {
                let records = diesel::delete(
                    cot_records::table
                        .filter(cot_records::report_type.eq(rt))
                        .filter(cot_records::sub_type.eq(st)),
                )
                .execute(conn)?;
                diesel::delete(
                    download_ledger::table
                        .filter(download_ledger::report_type.eq(rt))
                        .filter(download_ledger::sub_type.eq(st)),
                )
                .execute(conn)?;
                Ok(records)
            })?;
        info!(%variant, records = deleted, "deleted variant data");
        Ok(deleted)
    }
}
