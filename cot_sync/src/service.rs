//! Read-only queries over the store, shaped exactly like the exported artifacts.
//!
//! Used by the CLI read commands. Safe to use while a pipeline run is writing: every
//! query sees committed data only.

use cot_ingestor::models::price::PriceBar;
use cot_ingestor::models::report::{GroupDef, ReportType, Variant};
use indexmap::IndexMap;
use serde::Serialize;

use crate::analytics::Calculator;
use crate::export::payload::{build_market_payload, MarketDetail, MarketMeta, ScreenerRow};
use crate::store::{CotStore, MarketInfo, StoreResult, VariantStats};

/// Store-wide and per-variant counts.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub db_path: String,
    pub overall: VariantStats,
    /// Keyed like `legacy_fo`.
    pub variants: IndexMap<String, VariantStats>,
}

pub struct ReadService {
    store: CotStore,
    calculator: Calculator,
}

impl ReadService {
    pub fn new(store: CotStore, calculator: Calculator) -> Self {
        Self { store, calculator }
    }

    pub fn markets(&mut self, variant: Variant) -> StoreResult<Vec<MarketMeta>> {
        Ok(self
            .store
            .get_all_markets_for_variant(variant)?
            .iter()
            .map(|m| MarketMeta::new(m, variant))
            .collect())
    }

    /// Full detail for one market, or `None` if the market has no rows in `variant`.
    pub fn market_detail(
        &mut self,
        code: &str,
        variant: Variant,
        prices: Option<&[PriceBar]>,
    ) -> StoreResult<Option<MarketDetail>> {
        let records = self.store.get_market_series(code, variant)?;
        let Some(newest) = records.first() else {
            return Ok(None);
        };
        let market = MarketInfo {
            code: newest.market_code.clone(),
            name: newest.market_name.clone(),
            exchange_code: newest.exchange_code.clone(),
            commodity_code: newest.commodity_code.clone(),
        };
        Ok(
            build_market_payload(&self.calculator, &market, variant, &records, prices)
                .map(|p| p.detail),
        )
    }

    /// One row per market, ordered like the market list.
    pub fn screener(&mut self, variant: Variant) -> StoreResult<Vec<ScreenerRow>> {
        let markets = self.store.get_all_markets_for_variant(variant)?;
        let mut series = self.store.get_bulk_for_variant(variant)?;
        Ok(markets
            .iter()
            .filter_map(|market| {
                let records = series.shift_remove(&market.code)?;
                build_market_payload(&self.calculator, market, variant, &records, None)
                    .map(|p| p.screener)
            })
            .collect())
    }

    pub fn groups(report_type: ReportType) -> &'static [GroupDef] {
        report_type.groups()
    }

    pub fn status(&mut self) -> StoreResult<StoreStatus> {
        let overall = self.store.get_variant_stats(None, None)?;
        let mut variants = IndexMap::new();
        for variant in Variant::all() {
            let stats = self
                .store
                .get_variant_stats(Some(variant.report_type), Some(variant.sub_type))?;
            variants.insert(variant.key(), stats);
        }
        Ok(StoreStatus {
            db_path: self.store.path().to_string(),
            overall,
            variants,
        })
    }
}
