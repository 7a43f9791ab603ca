//! Artifact payloads shared by the exporter and the read service.

use chrono::NaiveDate;
use cot_ingestor::models::price::PriceBar;
use cot_ingestor::models::record::NormalizedRecord;
use cot_ingestor::models::report::{GroupDef, GroupKey, Signal, Variant};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::analytics::{Calculator, ComputedWeek, Stats, round1};
use crate::export::categories::categorize;
use crate::store::MarketInfo;

/// Market metadata as written to market lists and detail files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketMeta {
    pub code: String,
    pub name: String,
    pub exchange: String,
    pub category: &'static str,
    pub category_display: &'static str,
    pub report_type: &'static str,
    pub report_type_display: &'static str,
    pub subtype: &'static str,
    pub subtype_display: &'static str,
}

impl MarketMeta {
    pub fn new(market: &MarketInfo, variant: Variant) -> Self {
        let name = display_name(market);
        let (category, category_display) = categorize(&name);
        Self {
            code: market.code.clone(),
            name,
            exchange: market.exchange_code.clone(),
            category,
            category_display,
            report_type: variant.report_type.code(),
            report_type_display: variant.report_type.display_name(),
            subtype: variant.sub_type.code(),
            subtype_display: variant.sub_type.display_name(),
        }
    }
}

fn display_name(market: &MarketInfo) -> String {
    if market.name.is_empty() {
        market.code.clone()
    } else {
        market.name.clone()
    }
}

/// Full per-market document.
#[derive(Debug, Clone, Serialize)]
pub struct MarketDetail {
    pub market: MarketMeta,
    pub groups: &'static [GroupDef],
    pub weeks: Vec<ComputedWeek>,
    pub stats: Stats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices: Option<Vec<PriceBar>>,
}

/// Group columns of a screener row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerGroup {
    pub key: GroupKey,
    pub long: Option<i64>,
    pub short: Option<i64>,
    pub net: Option<i64>,
    pub change: Option<i64>,
    pub change_long: Option<i64>,
    pub change_short: Option<i64>,
    pub pct_oi: Option<f64>,
    /// Week-over-week change of `pct_oi`.
    pub pct_oi_change: Option<f64>,
    pub cot_1y: Option<f64>,
    pub crowded: Option<f64>,
    pub signal: Option<Signal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalEntry {
    pub group: &'static str,
    pub signal: Signal,
}

/// One screener line: the latest period of a market plus deltas to the one before.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerRow {
    pub code: String,
    pub name: String,
    pub exchange_code: String,
    pub category: &'static str,
    pub category_display: &'static str,
    pub date: NaiveDate,
    pub open_interest: Option<f64>,
    pub oi_change: Option<f64>,
    pub groups: Vec<ScreenerGroup>,
    pub signals: Vec<SignalEntry>,
}

impl ScreenerRow {
    /// Builds a row from the newest week and, when present, the week before it.
    pub fn new(
        meta: &MarketMeta,
        exchange_code: &str,
        groups: &'static [GroupDef],
        latest: &ComputedWeek,
        prev: Option<&ComputedWeek>,
    ) -> Self {
        let mut signals = Vec::new();
        let columns = groups
            .iter()
            .zip(&latest.groups)
            .map(|(def, g)| {
                let prev_pct = prev.and_then(|w| w.group(def.key)).and_then(|p| p.pct_net_oi);
                if let Some(signal) = g.crowded.signal {
                    signals.push(SignalEntry {
                        group: def.short,
                        signal,
                    });
                }
                ScreenerGroup {
                    key: def.key,
                    long: g.long,
                    short: g.short,
                    net: g.net,
                    change: g.change,
                    change_long: g.change_long,
                    change_short: g.change_short,
                    pct_oi: g.pct_net_oi,
                    pct_oi_change: match (g.pct_net_oi, prev_pct) {
                        (Some(cur), Some(before)) => Some(round1(cur - before)),
                        _ => None,
                    },
                    cot_1y: g.cot_index_1y,
                    crowded: g.crowded.value,
                    signal: g.crowded.signal,
                }
            })
            .collect();

        Self {
            code: meta.code.clone(),
            name: meta.name.clone(),
            exchange_code: exchange_code.to_string(),
            category: meta.category,
            category_display: meta.category_display,
            date: latest.date,
            open_interest: latest.open_interest,
            oi_change: latest.oi_change,
            groups: columns,
            signals,
        }
    }
}

impl Serialize for ScreenerRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(9 + self.groups.len() * 11))?;
        map.serialize_entry("code", &self.code)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("exchange_code", &self.exchange_code)?;
        map.serialize_entry("category", self.category)?;
        map.serialize_entry("category_display", self.category_display)?;
        map.serialize_entry("date", &self.date)?;
        map.serialize_entry("open_interest", &self.open_interest)?;
        map.serialize_entry("oi_change", &self.oi_change)?;
        for g in &self.groups {
            let k = g.key.as_str();
            map.serialize_entry(&format!("{k}_long"), &g.long)?;
            map.serialize_entry(&format!("{k}_short"), &g.short)?;
            map.serialize_entry(&format!("{k}_net"), &g.net)?;
            map.serialize_entry(&format!("{k}_change"), &g.change)?;
            map.serialize_entry(&format!("{k}_change_long"), &g.change_long)?;
            map.serialize_entry(&format!("{k}_change_short"), &g.change_short)?;
            map.serialize_entry(&format!("{k}_pct_oi"), &g.pct_oi)?;
            map.serialize_entry(&format!("{k}_pct_oi_change"), &g.pct_oi_change)?;
            map.serialize_entry(&format!("cot_{k}_1y"), &g.cot_1y)?;
            map.serialize_entry(&format!("crowded_{k}"), &g.crowded)?;
            map.serialize_entry(&format!("signal_{k}"), &g.signal)?;
        }
        map.serialize_entry("signals", &self.signals)?;
        map.end()
    }
}

/// Everything derived for one market in one variant.
#[derive(Debug, Clone)]
pub struct MarketPayload {
    pub detail: MarketDetail,
    pub screener: ScreenerRow,
}

/// Runs the calculator over `records` (newest first) and assembles the artifacts.
///
/// Returns `None` when there is nothing to show for the market.
pub fn build_market_payload(
    calculator: &Calculator,
    market: &MarketInfo,
    variant: Variant,
    records: &[NormalizedRecord],
    prices: Option<&[PriceBar]>,
) -> Option<MarketPayload> {
    let computed = calculator.compute(records, variant.report_type);
    let latest = computed.weeks.first()?;
    let groups = variant.report_type.groups();
    let meta = MarketMeta::new(market, variant);
    let screener = ScreenerRow::new(
        &meta,
        &market.exchange_code,
        groups,
        latest,
        computed.weeks.get(1),
    );
    let prices = prices.filter(|p| !p.is_empty()).map(<[PriceBar]>::to_vec);

    Some(MarketPayload {
        detail: MarketDetail {
            market: meta,
            groups,
            weeks: computed.weeks,
            stats: computed.stats,
            prices,
        },
        screener,
    })
}
