//! Positioning analytics over a market's weekly series.
//!
//! [`Calculator::compute`] is pure: newest-first records in, per-week derived values
//! and aggregate statistics out. Nothing is cached here; callers recompute from the
//! stored series on every export or read.
//!
//! Numbers are rounded half-to-even so results match the published reference figures
//! exactly. COT Index windows run over integer-rounded nets.

mod stats;
mod week;

use cot_ingestor::models::record::NormalizedRecord;
use cot_ingestor::models::report::{GroupDef, ReportType, Signal, TraderRole};
use serde::{Deserialize, Serialize};

pub use stats::{StatBlock, StatKey, StatValue, Stats};
pub use week::{ComputedWeek, Crowded, GroupWeek};

/// Index value used when a window holds at least two values that are all equal.
pub const INDEX_MIDPOINT: f64 = 50.0;

/// Window lengths (in report periods) and signal thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    pub lookback_3m: usize,
    pub lookback_1y: usize,
    pub lookback_3y: usize,
    pub wci_lookback: usize,
    pub window_5y: usize,
    pub avg_window: usize,
    /// 1-year index at or above this is "crowded long".
    pub buy_threshold: f64,
    /// 1-year index at or below this is "crowded short".
    pub sell_threshold: f64,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            lookback_3m: 13,
            lookback_1y: 52,
            lookback_3y: 156,
            wci_lookback: 26,
            window_5y: 260,
            avg_window: 13,
            buy_threshold: 80.0,
            sell_threshold: 20.0,
        }
    }
}

/// Calculator output for one market and variant.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Computation {
    /// Newest first, one per input record.
    pub weeks: Vec<ComputedWeek>,
    pub stats: Stats,
}

#[derive(Debug, Clone, Default)]
pub struct Calculator {
    config: CalculatorConfig,
}

impl Calculator {
    pub fn new(config: CalculatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalculatorConfig {
        &self.config
    }

    /// Computes every derived field for `records` (newest first).
    pub fn compute(&self, records: &[NormalizedRecord], report_type: ReportType) -> Computation {
        let groups = report_type.groups();
        let mut weeks: Vec<ComputedWeek> =
            records.iter().map(|r| week::build_week(r, groups)).collect();
        for (slot, def) in groups.iter().enumerate() {
            self.apply_indices(&mut weeks, slot, def);
        }
        let stats = stats::compute_stats(&weeks, groups.len(), &self.config);
        Computation { weeks, stats }
    }

    fn apply_indices(&self, weeks: &mut [ComputedWeek], slot: usize, def: &GroupDef) {
        let nets: Vec<Option<i64>> = weeks.iter().map(|w| w.groups[slot].net).collect();
        let cfg = &self.config;

        for (i, week) in weeks.iter_mut().enumerate() {
            let g = &mut week.groups[slot];
            if nets[i].is_none() {
                continue;
            }
            g.cot_index_3m = cot_index(&nets, i, cfg.lookback_3m);
            g.cot_index_1y = cot_index(&nets, i, cfg.lookback_1y);
            g.cot_index_3y = cot_index(&nets, i, cfg.lookback_3y);
            g.wci = cot_index(&nets, i, cfg.wci_lookback);
            g.crowded = match g.cot_index_1y {
                Some(value) => Crowded {
                    value: Some(round1(value)),
                    signal: self.signal(value, def.role),
                },
                None => Crowded::default(),
            };
        }
    }

    /// Crowding signal for a 1-year index reading.
    pub fn signal(&self, index: f64, role: TraderRole) -> Option<Signal> {
        let high = index >= self.config.buy_threshold;
        let low = index <= self.config.sell_threshold;
        match role {
            TraderRole::Commercial if high => Some(Signal::Buy),
            TraderRole::Commercial if low => Some(Signal::Sell),
            TraderRole::Speculative | TraderRole::Small if high => Some(Signal::Sell),
            TraderRole::Speculative | TraderRole::Small if low => Some(Signal::Buy),
            _ => None,
        }
    }
}

/// Min-max position of `nets[i]` within the `lookback` periods starting at `i`
/// (toward older periods), on a 0..=100 scale.
///
/// `None` when the current value is missing or the window has fewer than two values.
pub fn cot_index(nets: &[Option<i64>], i: usize, lookback: usize) -> Option<f64> {
    let current = nets.get(i).copied().flatten()?;
    let end = nets.len().min(i.saturating_add(lookback));
    let window: Vec<i64> = nets[i..end].iter().flatten().copied().collect();
    if window.len() < 2 {
        return None;
    }
    let (mut lo, mut hi) = (window[0], window[0]);
    for &v in &window[1..] {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if hi == lo {
        return Some(INDEX_MIDPOINT);
    }
    let idx = (current - lo) as f64 / (hi - lo) as f64 * 100.0;
    Some(round1(idx))
}

/// Rounds the exact binary value to one decimal, ties to even.
///
/// `{:.1}` formatting is correctly rounded, so 0.15 (stored just below) becomes 0.1
/// and 0.65 (stored just above) becomes 0.7.
pub fn round1(v: f64) -> f64 {
    format!("{v:.1}").parse().unwrap_or(v)
}

/// Rounds to an integer, ties to even.
pub fn round_int(v: f64) -> i64 {
    v.round_ties_even() as i64
}

#[cfg(test)]
mod tests;
