use chrono::NaiveDate;
use cot_ingestor::models::record::NormalizedRecord;
use cot_ingestor::models::report::{ReportType, SubType, Variant};
use diesel::dsl::{count_distinct, count_star, max, min};
use diesel::prelude::*;
use indexmap::IndexMap;

use crate::models::CotRecordRow;
use crate::schema::cot_records::dsl as cr;
use crate::store::{CotStore, MarketInfo, MarketSeries, StoreResult, VariantStats};

fn to_records(rows: Vec<CotRecordRow>) -> StoreResult<Vec<NormalizedRecord>> {
    rows.into_iter()
        .map(|r| NormalizedRecord::try_from(r).map_err(anyhow::Error::from))
        .collect()
}

/// Groups newest-first rows by market code, keeping row order within each market.
fn group_by_market(
    rows: Vec<CotRecordRow>,
) -> StoreResult<IndexMap<String, Vec<NormalizedRecord>>> {
    let mut grouped: IndexMap<String, Vec<NormalizedRecord>> = IndexMap::new();
    for row in rows {
        let record = NormalizedRecord::try_from(row)?;
        grouped
            .entry(record.market_code.clone())
            .or_default()
            .push(record);
    }
    Ok(grouped)
}

impl CotStore {
    /// All records of one market in `variant`, newest first.
    pub fn get_market_series(
        &mut self,
        market_code: &str,
        variant: Variant,
    ) -> StoreResult<Vec<NormalizedRecord>> {
        let rows = cr::cot_records
            .filter(cr::market_code.eq(market_code))
            .filter(cr::report_type.eq(variant.report_type.code()))
            .filter(cr::sub_type.eq(variant.sub_type.code()))
            .order(cr::report_date.desc())
            .select(CotRecordRow::as_select())
            .load(&mut self.conn)?;
        to_records(rows)
    }

    /// Distinct markets in `variant`, described by their newest row, ordered by name.
    pub fn get_all_markets_for_variant(&mut self, variant: Variant) -> StoreResult<Vec<MarketInfo>> {
        let rows: Vec<(String, String, String, String)> = cr::cot_records
            .filter(cr::report_type.eq(variant.report_type.code()))
            .filter(cr::sub_type.eq(variant.sub_type.code()))
            .order((cr::market_code.asc(), cr::report_date.desc()))
            .select((
                cr::market_code,
                cr::market_name,
                cr::exchange_code,
                cr::commodity_code,
            ))
            .load(&mut self.conn)?;

        let mut markets: Vec<MarketInfo> = Vec::new();
        for (code, name, exchange_code, commodity_code) in rows {
            if markets.last().is_some_and(|m| m.code == code) {
                continue;
            }
            markets.push(MarketInfo {
                code,
                name,
                exchange_code,
                commodity_code,
            });
        }
        markets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        Ok(markets)
    }

    /// Every record of `variant`, grouped by market code (ascending), newest first
    /// within each market. One query for the whole variant.
    pub fn get_bulk_for_variant(
        &mut self,
        variant: Variant,
    ) -> StoreResult<IndexMap<String, Vec<NormalizedRecord>>> {
        let rows = cr::cot_records
            .filter(cr::report_type.eq(variant.report_type.code()))
            .filter(cr::sub_type.eq(variant.sub_type.code()))
            .order((cr::market_code.asc(), cr::report_date.desc()))
            .select(CotRecordRow::as_select())
            .load(&mut self.conn)?;
        group_by_market(rows)
    }

    /// A page of markets (ordered as [`Self::get_all_markets_for_variant`]) with
    /// their full series.
    ///
    /// Lists the variant's markets on every call; callers walking all pages should
    /// list once and use [`Self::get_series_for_markets`].
    pub fn get_variant_page(
        &mut self,
        variant: Variant,
        limit: usize,
        offset: usize,
    ) -> StoreResult<Vec<MarketSeries>> {
        let markets = self.get_all_markets_for_variant(variant)?;
        let end = markets.len().min(offset.saturating_add(limit));
        let page = markets.get(offset..end).unwrap_or_default();
        self.get_series_for_markets(variant, page)
    }

    /// Newest-first series of each of `markets` within `variant`, in the given order.
    /// A market without rows comes back with an empty series.
    pub fn get_series_for_markets(
        &mut self,
        variant: Variant,
        markets: &[MarketInfo],
    ) -> StoreResult<Vec<MarketSeries>> {
        if markets.is_empty() {
            return Ok(Vec::new());
        }
        let codes: Vec<&str> = markets.iter().map(|m| m.code.as_str()).collect();
        let rows = cr::cot_records
            .filter(cr::report_type.eq(variant.report_type.code()))
            .filter(cr::sub_type.eq(variant.sub_type.code()))
            .filter(cr::market_code.eq_any(codes))
            .order((cr::market_code.asc(), cr::report_date.desc()))
            .select(CotRecordRow::as_select())
            .load(&mut self.conn)?;
        let mut grouped = group_by_market(rows)?;

        Ok(markets
            .iter()
            .map(|market| MarketSeries {
                market: market.clone(),
                records: grouped.shift_remove(&market.code).unwrap_or_default(),
            })
            .collect())
    }

    /// Counts and date range, optionally restricted by report type and/or sub-type.
    pub fn get_variant_stats(
        &mut self,
        report_type: Option<ReportType>,
        sub_type: Option<SubType>,
    ) -> StoreResult<VariantStats> {
        let mut query = cr::cot_records
            .select((
                count_star(),
                count_distinct(cr::market_code),
                count_distinct(cr::report_date),
                min(cr::report_date),
                max(cr::report_date),
            ))
            .into_boxed();
        if let Some(rt) = report_type {
            query = query.filter(cr::report_type.eq(rt.code()));
        }
        if let Some(st) = sub_type {
            query = query.filter(cr::sub_type.eq(st.code()));
        }
        let (total_records, total_markets, total_periods, first_date, last_date): (
            i64,
            i64,
            i64,
            Option<NaiveDate>,
            Option<NaiveDate>,
        ) = query.first(&mut self.conn)?;

        Ok(VariantStats {
            total_records,
            total_markets,
            total_periods,
            first_date,
            last_date,
        })
    }

    /// Newest report date in `variant`, or in the whole store.
    pub fn latest_date(&mut self, variant: Option<Variant>) -> StoreResult<Option<NaiveDate>> {
        let stats = self.get_variant_stats(
            variant.map(|v| v.report_type),
            variant.map(|v| v.sub_type),
        )?;
        Ok(stats.last_date)
    }
}
