use std::collections::BTreeSet;

use chrono::{SecondsFormat, Utc};
use cot_ingestor::models::report::Variant;
use diesel::prelude::*;

use crate::models::LedgerRow;
use crate::schema::download_ledger::dsl as dl;
use crate::store::{CotStore, StoreResult};

impl CotStore {
    /// Whether the yearly archive for `variant`/`year` has been stored.
    pub fn is_year_ingested(&mut self, variant: Variant, year: i32) -> StoreResult<bool> {
        let found = dl::download_ledger
            .filter(dl::report_type.eq(variant.report_type.code()))
            .filter(dl::sub_type.eq(variant.sub_type.code()))
            .filter(dl::year.eq(year))
            .select(dl::year)
            .first::<i32>(&mut self.conn)
            .optional()?;
        Ok(found.is_some())
    }

    /// Records that `year` was stored with `row_count` rows, replacing any earlier entry.
    pub fn record_year_ingested(
        &mut self,
        variant: Variant,
        year: i32,
        row_count: usize,
    ) -> StoreResult<()> {
        let row = LedgerRow {
            report_type: variant.report_type.code().to_string(),
            sub_type: variant.sub_type.code().to_string(),
            year,
            row_count: i32::try_from(row_count).unwrap_or(i32::MAX),
            ingested_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        diesel::replace_into(dl::download_ledger)
            .values(&row)
            .execute(&mut self.conn)?;
        Ok(())
    }

    /// Years already stored for `variant`.
    pub fn ingested_years(&mut self, variant: Variant) -> StoreResult<BTreeSet<i32>> {
        let years = dl::download_ledger
            .filter(dl::report_type.eq(variant.report_type.code()))
            .filter(dl::sub_type.eq(variant.sub_type.code()))
            .select(dl::year)
            .load::<i32>(&mut self.conn)?;
        Ok(years.into_iter().collect())
    }

    /// Full ledger for `variant`, oldest year first.
    pub fn ledger(&mut self, variant: Variant) -> StoreResult<Vec<LedgerRow>> {
        Ok(dl::download_ledger
            .filter(dl::report_type.eq(variant.report_type.code()))
            .filter(dl::sub_type.eq(variant.sub_type.code()))
            .order(dl::year.asc())
            .select(LedgerRow::as_select())
            .load(&mut self.conn)?)
    }
}
