//! Diesel models mapping to the database schema.
//!
//! These types mirror the tables defined in the embedded migrations and in
//! [`crate::schema`]:
//! - [`crate::schema::cot_records`]: one normalized report row per natural key
//! - [`crate::schema::download_ledger`]: yearly archives already stored per variant
//! - [`crate::schema::price_bars`] and [`crate::schema::price_fetches`]: persisted daily
//!   prices and when each market's bars were fetched
//!
//! Group columns are flattened as `g{n}_{measure}`; which slots are meaningful for a
//! row depends on its report type and is not stored.

use cot_ingestor::models::price::PriceBar;
use cot_ingestor::models::record::{GroupPositions, NormalizedRecord};
use diesel::prelude::*;

use crate::schema::*;
use crate::store::StoreError;

/// A row in [`crate::schema::cot_records`].
///
/// Keyed by `(market_code, report_date, report_type, sub_type)`. `None` values are
/// written as SQL `NULL`, never as column defaults, so a replaced row carries no
/// stale values.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = cot_records, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_default_value = false)]
pub struct CotRecordRow {
    /// CFTC contract market code.
    pub market_code: String,
    /// Report "as of" date.
    pub report_date: chrono::NaiveDate,
    /// Report type code (`legacy`, `disagg`, `tff`).
    pub report_type: String,
    /// Sub-type code (`fo`, `co`).
    pub sub_type: String,
    /// Market and exchange name as published.
    pub market_name: String,
    /// Exchange / market initials code.
    pub exchange_code: String,
    /// CFTC commodity code.
    pub commodity_code: String,
    /// Total open interest.
    pub open_interest: Option<f64>,
    /// Week-over-week change in open interest.
    pub open_interest_change: Option<f64>,
    /// G1 long positions.
    pub g1_long: Option<f64>,
    /// G1 short positions.
    pub g1_short: Option<f64>,
    /// G1 spreading positions.
    pub g1_spread: Option<f64>,
    /// G1 change in long positions.
    pub g1_long_change: Option<f64>,
    /// G1 change in short positions.
    pub g1_short_change: Option<f64>,
    /// G1 change in spreading positions.
    pub g1_spread_change: Option<f64>,
    /// G1 long positions as % of open interest.
    pub g1_pct_long: Option<f64>,
    /// G1 short positions as % of open interest.
    pub g1_pct_short: Option<f64>,
    /// G1 spreading positions as % of open interest.
    pub g1_pct_spread: Option<f64>,
    /// G2 long positions.
    pub g2_long: Option<f64>,
    /// G2 short positions.
    pub g2_short: Option<f64>,
    /// G2 spreading positions.
    pub g2_spread: Option<f64>,
    /// G2 change in long positions.
    pub g2_long_change: Option<f64>,
    /// G2 change in short positions.
    pub g2_short_change: Option<f64>,
    /// G2 change in spreading positions.
    pub g2_spread_change: Option<f64>,
    /// G2 long positions as % of open interest.
    pub g2_pct_long: Option<f64>,
    /// G2 short positions as % of open interest.
    pub g2_pct_short: Option<f64>,
    /// G2 spreading positions as % of open interest.
    pub g2_pct_spread: Option<f64>,
    /// G3 long positions.
    pub g3_long: Option<f64>,
    /// G3 short positions.
    pub g3_short: Option<f64>,
    /// G3 spreading positions.
    pub g3_spread: Option<f64>,
    /// G3 change in long positions.
    pub g3_long_change: Option<f64>,
    /// G3 change in short positions.
    pub g3_short_change: Option<f64>,
    /// G3 change in spreading positions.
    pub g3_spread_change: Option<f64>,
    /// G3 long positions as % of open interest.
    pub g3_pct_long: Option<f64>,
    /// G3 short positions as % of open interest.
    pub g3_pct_short: Option<f64>,
    /// G3 spreading positions as % of open interest.
    pub g3_pct_spread: Option<f64>,
    /// G4 long positions.
    pub g4_long: Option<f64>,
    /// G4 short positions.
    pub g4_short: Option<f64>,
    /// G4 spreading positions.
    pub g4_spread: Option<f64>,
    /// G4 change in long positions.
    pub g4_long_change: Option<f64>,
    /// G4 change in short positions.
    pub g4_short_change: Option<f64>,
    /// G4 change in spreading positions.
    pub g4_spread_change: Option<f64>,
    /// G4 long positions as % of open interest.
    pub g4_pct_long: Option<f64>,
    /// G4 short positions as % of open interest.
    pub g4_pct_short: Option<f64>,
    /// G4 spreading positions as % of open interest.
    pub g4_pct_spread: Option<f64>,
    /// G5 long positions.
    pub g5_long: Option<f64>,
    /// G5 short positions.
    pub g5_short: Option<f64>,
    /// G5 spreading positions.
    pub g5_spread: Option<f64>,
    /// G5 change in long positions.
    pub g5_long_change: Option<f64>,
    /// G5 change in short positions.
    pub g5_short_change: Option<f64>,
    /// G5 change in spreading positions.
    pub g5_spread_change: Option<f64>,
    /// G5 long positions as % of open interest.
    pub g5_pct_long: Option<f64>,
    /// G5 short positions as % of open interest.
    pub g5_pct_short: Option<f64>,
    /// G5 spreading positions as % of open interest.
    pub g5_pct_spread: Option<f64>,
    /// Total reportable long positions.
    pub total_rept_long: Option<f64>,
    /// Total reportable short positions.
    pub total_rept_short: Option<f64>,
}

impl From<&NormalizedRecord> for CotRecordRow {
    fn from(r: &NormalizedRecord) -> Self {
        let g1 = &r.groups[0];
        let g2 = &r.groups[1];
        let g3 = &r.groups[2];
        let g4 = &r.groups[3];
        let g5 = &r.groups[4];
        Self {
            market_code: r.market_code.clone(),
            report_date: r.report_date,
            report_type: r.report_type.code().to_string(),
            sub_type: r.sub_type.code().to_string(),
            market_name: r.market_name.clone(),
            exchange_code: r.exchange_code.clone(),
            commodity_code: r.commodity_code.clone(),
            open_interest: r.open_interest,
            open_interest_change: r.open_interest_change,
            g1_long: g1.long,
            g1_short: g1.short,
            g1_spread: g1.spread,
            g1_long_change: g1.long_change,
            g1_short_change: g1.short_change,
            g1_spread_change: g1.spread_change,
            g1_pct_long: g1.pct_long,
            g1_pct_short: g1.pct_short,
            g1_pct_spread: g1.pct_spread,
            g2_long: g2.long,
            g2_short: g2.short,
            g2_spread: g2.spread,
            g2_long_change: g2.long_change,
            g2_short_change: g2.short_change,
            g2_spread_change: g2.spread_change,
            g2_pct_long: g2.pct_long,
            g2_pct_short: g2.pct_short,
            g2_pct_spread: g2.pct_spread,
            g3_long: g3.long,
            g3_short: g3.short,
            g3_spread: g3.spread,
            g3_long_change: g3.long_change,
            g3_short_change: g3.short_change,
            g3_spread_change: g3.spread_change,
            g3_pct_long: g3.pct_long,
            g3_pct_short: g3.pct_short,
            g3_pct_spread: g3.pct_spread,
            g4_long: g4.long,
            g4_short: g4.short,
            g4_spread: g4.spread,
            g4_long_change: g4.long_change,
            g4_short_change: g4.short_change,
            g4_spread_change: g4.spread_change,
            g4_pct_long: g4.pct_long,
            g4_pct_short: g4.pct_short,
            g4_pct_spread: g4.pct_spread,
            g5_long: g5.long,
            g5_short: g5.short,
            g5_spread: g5.spread,
            g5_long_change: g5.long_change,
            g5_short_change: g5.short_change,
            g5_spread_change: g5.spread_change,
            g5_pct_long: g5.pct_long,
            g5_pct_short: g5.pct_short,
            g5_pct_spread: g5.pct_spread,
            total_rept_long: r.total_rept_long,
            total_rept_short: r.total_rept_short,
        }
    }
}

impl TryFrom<CotRecordRow> for NormalizedRecord {
    type Error = StoreError;

    fn try_from(row: CotRecordRow) -> Result<Self, Self::Error> {
        let groups = [
            GroupPositions {
                long: row.g1_long,
                short: row.g1_short,
                spread: row.g1_spread,
                long_change: row.g1_long_change,
                short_change: row.g1_short_change,
                spread_change: row.g1_spread_change,
                pct_long: row.g1_pct_long,
                pct_short: row.g1_pct_short,
                pct_spread: row.g1_pct_spread,
            },
            GroupPositions {
                long: row.g2_long,
                short: row.g2_short,
                spread: row.g2_spread,
                long_change: row.g2_long_change,
                short_change: row.g2_short_change,
                spread_change: row.g2_spread_change,
                pct_long: row.g2_pct_long,
                pct_short: row.g2_pct_short,
                pct_spread: row.g2_pct_spread,
            },
            GroupPositions {
                long: row.g3_long,
                short: row.g3_short,
                spread: row.g3_spread,
                long_change: row.g3_long_change,
                short_change: row.g3_short_change,
                spread_change: row.g3_spread_change,
                pct_long: row.g3_pct_long,
                pct_short: row.g3_pct_short,
                pct_spread: row.g3_pct_spread,
            },
            GroupPositions {
                long: row.g4_long,
                short: row.g4_short,
                spread: row.g4_spread,
                long_change: row.g4_long_change,
                short_change: row.g4_short_change,
                spread_change: row.g4_spread_change,
                pct_long: row.g4_pct_long,
                pct_short: row.g4_pct_short,
                pct_spread: row.g4_pct_spread,
            },
            GroupPositions {
                long: row.g5_long,
                short: row.g5_short,
                spread: row.g5_spread,
                long_change: row.g5_long_change,
                short_change: row.g5_short_change,
                spread_change: row.g5_spread_change,
                pct_long: row.g5_pct_long,
                pct_short: row.g5_pct_short,
                pct_spread: row.g5_pct_spread,
            },
        ];
        Ok(Self {
            report_type: row.report_type.parse()?,
            sub_type: row.sub_type.parse()?,
            report_date: row.report_date,
            market_code: row.market_code,
            market_name: row.market_name,
            exchange_code: row.exchange_code,
            commodity_code: row.commodity_code,
            open_interest: row.open_interest,
            open_interest_change: row.open_interest_change,
            groups,
            total_rept_long: row.total_rept_long,
            total_rept_short: row.total_rept_short,
        })
    }
}

/// A row in [`crate::schema::download_ledger`]: one stored yearly archive.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = download_ledger, check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerRow {
    /// Report type code.
    pub report_type: String,
    /// Sub-type code.
    pub sub_type: String,
    /// Calendar year of the archive.
    pub year: i32,
    /// Records stored from the archive.
    pub row_count: i32,
    /// When the archive was stored, RFC3339 UTC.
    pub ingested_at: String,
}

/// A row in [`crate::schema::price_bars`].
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = price_bars, check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceBarRow {
    pub market_code: String,
    pub bar_date: chrono::NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl PriceBarRow {
    pub fn new(market_code: &str, bar: &PriceBar) -> Self {
        Self {
            market_code: market_code.to_string(),
            bar_date: bar.date,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: i64::try_from(bar.volume).unwrap_or(i64::MAX),
        }
    }
}

impl From<PriceBarRow> for PriceBar {
    fn from(row: PriceBarRow) -> Self {
        Self {
            date: row.bar_date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: u64::try_from(row.volume).unwrap_or(0),
        }
    }
}

/// A row in [`crate::schema::price_fetches`]: when a market's stored bars were fetched.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable)]
#[diesel(table_name = price_fetches, check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceFetchRow {
    pub market_code: String,
    /// RFC3339 UTC.
    pub fetched_at: String,
}
