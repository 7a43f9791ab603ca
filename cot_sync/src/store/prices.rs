use chrono::{DateTime, SecondsFormat, Utc};
use cot_ingestor::models::price::PriceBar;
use diesel::prelude::*;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::models::{PriceBarRow, PriceFetchRow};
use crate::prices::PriceData;
use crate::schema::{price_bars, price_fetches};
use crate::store::{CotStore, StoreResult};

/// Persisted bars of one market and when they were fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPrices {
    pub fetched_at: DateTime<Utc>,
    /// Oldest first.
    pub bars: Vec<PriceBar>,
}

impl CotStore {
    /// Replaces the stored bars of every market in `data`, stamped with `fetched_at`.
    ///
    /// Markets not in `data` keep whatever was stored before.
    pub fn save_prices(&mut self, data: &PriceData, fetched_at: DateTime<Utc>) -> StoreResult<usize> {
        if data.is_empty() {
            return Ok(0);
        }
        let stamp = fetched_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let written = self
            .conn
            .immediate_transaction::<_, anyhow::Error, _>(|conn| {
                let mut written = 0;
                for (code, bars) in data {
                    diesel::delete(price_bars::table.filter(price_bars::market_code.eq(code)))
                        .execute(conn)?;
                    for bar in bars {
                        written += diesel::insert_into(price_bars::table)
                            .values(&PriceBarRow::new(code, bar))
                            .execute(conn)?;
                    }
                    diesel::replace_into(price_fetches::table)
                        .values(&PriceFetchRow {
                            market_code: code.clone(),
                            fetched_at: stamp.clone(),
                        })
                        .execute(conn)?;
                }
                Ok(written)
            })?;
        debug!(markets = data.len(), bars = written, "stored prices");
        Ok(written)
    }

    /// Stored prices for `codes`, in the order of `codes`. Codes never fetched are
    /// left out.
    pub fn load_prices(&mut self, codes: &[String]) -> StoreResult<IndexMap<String, StoredPrices>> {
        if codes.is_empty() {
            return Ok(IndexMap::new());
        }
        let wanted: Vec<&str> = codes.iter().map(String::as_str).collect();
        let fetches: Vec<PriceFetchRow> = price_fetches::table
            .filter(price_fetches::market_code.eq_any(wanted))
            .select(PriceFetchRow::as_select())
            .load(&mut self.conn)?;
        let mut fetched: IndexMap<String, DateTime<Utc>> = IndexMap::new();
        for row in fetches {
            match DateTime::parse_from_rfc3339(&row.fetched_at) {
                Ok(at) => {
                    fetched.insert(row.market_code, at.with_timezone(&Utc));
                }
                Err(err) => {
                    warn!(code = %row.market_code, error = %err, "ignoring stored prices with bad fetch time");
                }
            }
        }

        let known: Vec<&str> = fetched.keys().map(String::as_str).collect();
        let rows: Vec<PriceBarRow> = price_bars::table
            .filter(price_bars::market_code.eq_any(known))
            .order((price_bars::market_code.asc(), price_bars::bar_date.asc()))
            .select(PriceBarRow::as_select())
            .load(&mut self.conn)?;
        let mut bars: IndexMap<String, Vec<PriceBar>> = IndexMap::new();
        for row in rows {
            bars.entry(row.market_code.clone()).or_default().push(row.into());
        }

        Ok(codes
            .iter()
            .filter_map(|code| {
                let fetched_at = *fetched.get(code)?;
                let bars = bars.shift_remove(code)?;
                Some((code.clone(), StoredPrices { fetched_at, bars }))
            })
            .collect())
    }
}
