use super::*;
use chrono::{Duration, NaiveDate};
use cot_ingestor::models::report::{GroupKey, SubType, Variant};
use proptest::prelude::*;

const LEGACY_FO: Variant = Variant::new(ReportType::Legacy, SubType::FuturesOnly);

fn latest() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 7).unwrap()
}

/// Newest-first legacy series where G1 and G2 carry `nets` as long positions.
fn series(nets: &[Option<f64>]) -> Vec<NormalizedRecord> {
    nets.iter()
        .enumerate()
        .map(|(i, net)| {
            let date = latest() - Duration::weeks(i as i64);
            let mut r = NormalizedRecord::new(LEGACY_FO, date, "001602");
            r.open_interest = Some(1_000.0);
            r.open_interest_change = Some(10.0);
            for key in [GroupKey::G1, GroupKey::G2] {
                let g = r.group_mut(key);
                g.long = net.map(|n| n + 100.0);
                g.short = Some(100.0);
            }
            r
        })
        .collect()
}

#[test]
fn index_is_midpoint_when_window_is_flat() {
    let records = series(&[Some(5.0); 4]);
    let out = Calculator::default().compute(&records, ReportType::Legacy);
    let g1 = &out.weeks[0].groups[0];
    assert_eq!(g1.cot_index_3m, Some(50.0));
    assert_eq!(g1.wci, Some(50.0));
}

#[test]
fn single_value_window_has_no_index() {
    let records = series(&[Some(5.0)]);
    let out = Calculator::default().compute(&records, ReportType::Legacy);
    let g1 = &out.weeks[0].groups[0];
    assert_eq!(g1.cot_index_1y, None);
    assert_eq!(g1.crowded, Crowded::default());
}

#[test]
fn index_scales_current_net_into_window_range() {
    let records = series(&[Some(75.0), Some(0.0), Some(100.0)]);
    let out = Calculator::default().compute(&records, ReportType::Legacy);
    assert_eq!(out.weeks[0].groups[0].cot_index_1y, Some(75.0));
    assert_eq!(out.weeks[1].groups[0].cot_index_1y, Some(0.0));
    assert_eq!(out.weeks[2].groups[0].cot_index_1y, None);
}

#[test]
fn missing_net_blanks_every_index_for_that_week() {
    let records = series(&[None, Some(1.0), Some(2.0)]);
    let out = Calculator::default().compute(&records, ReportType::Legacy);
    let g1 = &out.weeks[0].groups[0];
    assert_eq!(g1.net, None);
    assert_eq!((g1.cot_index_3m, g1.cot_index_1y, g1.wci), (None, None, None));
    assert_eq!(g1.crowded, Crowded::default());
    // The gap is skipped, not zero-filled, for the following week.
    assert_eq!(out.weeks[1].groups[0].cot_index_3m, Some(0.0));
}

#[test]
fn speculative_signal_is_inverted() {
    let records = series(&[Some(100.0), Some(0.0)]);
    let out = Calculator::default().compute(&records, ReportType::Legacy);
    let week = &out.weeks[0];
    // Legacy G1 are large speculators, G2 commercials.
    assert_eq!(week.groups[0].crowded.signal, Some(Signal::Sell));
    assert_eq!(week.groups[1].crowded.signal, Some(Signal::Buy));
    assert_eq!(week.groups[1].crowded.value, Some(100.0));
}

#[test]
fn signal_thresholds_are_inclusive() {
    let calc = Calculator::default();
    assert_eq!(calc.signal(80.0, TraderRole::Commercial), Some(Signal::Buy));
    assert_eq!(calc.signal(20.0, TraderRole::Commercial), Some(Signal::Sell));
    assert_eq!(calc.signal(50.0, TraderRole::Commercial), None);
    assert_eq!(calc.signal(20.0, TraderRole::Small), Some(Signal::Buy));
}

#[test]
fn integer_fields_round_half_to_even() {
    let mut r = NormalizedRecord::new(LEGACY_FO, latest(), "001602");
    r.open_interest = Some(400.0);
    let g = r.group_mut(GroupKey::G1);
    g.long = Some(2.5);
    g.short = Some(1.0);
    g.long_change = Some(3.5);
    let out = Calculator::default().compute(&[r], ReportType::Legacy);
    let g1 = &out.weeks[0].groups[0];
    assert_eq!(g1.long, Some(2));
    assert_eq!(g1.net, Some(2));
    assert_eq!(g1.change_long, Some(4));
    assert_eq!(g1.change, None);
    // Uses the unrounded net of 1.5.
    assert_eq!(g1.pct_net_oi, Some(0.4));
}

#[test]
fn one_decimal_rounding_follows_the_stored_value() {
    assert_eq!(round1(3.0 / 2000.0 * 100.0), 0.1);
    assert_eq!(round1(13.0 / 2000.0 * 100.0), 0.7);
    assert_eq!(round1(-0.35), -0.3);
    assert_eq!(round1(66.66666), 66.7);

    let mut records = series(&[Some(3.0), Some(13.0)]);
    for r in &mut records {
        r.open_interest = Some(2_000.0);
    }
    let out = Calculator::default().compute(&records, ReportType::Legacy);
    assert_eq!(out.weeks[0].groups[0].pct_net_oi, Some(0.1));
    assert_eq!(out.weeks[1].groups[0].pct_net_oi, Some(0.7));
}

#[test]
fn oi_pct_needs_nonzero_open_interest() {
    let mut records = series(&[Some(1.0)]);
    records[0].open_interest = Some(0.0);
    let out = Calculator::default().compute(&records, ReportType::Legacy);
    assert_eq!(out.weeks[0].oi_pct, None);
    assert_eq!(out.weeks[0].groups[0].pct_net_oi, None);
}

#[test]
fn stats_cover_windows_and_use_matching_precision() {
    let records = series(&[Some(10.0), Some(20.0), Some(30.0)]);
    let cfg = CalculatorConfig {
        window_5y: 2,
        avg_window: 2,
        ..CalculatorConfig::default()
    };
    let out = Calculator::new(cfg).compute(&records, ReportType::Legacy);
    let stats = &out.stats;
    assert_eq!(stats.max["g1_net"], Some(StatValue::Int(30)));
    assert_eq!(stats.min["g1_net"], Some(StatValue::Int(10)));
    assert_eq!(stats.max_5y["g1_net"], Some(StatValue::Int(20)));
    assert_eq!(stats.avg_13w["g1_net"], Some(StatValue::Int(15)));
    assert_eq!(stats.max["oi_pct"], Some(StatValue::Pct(1.0)));
    assert_eq!(stats.max["g3_net"], None);
    assert_eq!(stats.max.len(), 3 + 3 * 5);
}

#[test]
fn empty_series_serializes_to_empty_stats() {
    let out = Calculator::default().compute(&[], ReportType::Disaggregated);
    assert!(out.weeks.is_empty());
    assert!(out.stats.is_empty());
    assert_eq!(serde_json::to_string(&out.stats).unwrap(), "{}");
}

#[test]
fn week_serializes_flat_keys() {
    let records = series(&[Some(3.0), Some(1.0)]);
    let out = Calculator::default().compute(&records, ReportType::Legacy);
    let v = serde_json::to_value(&out.weeks[0]).unwrap();
    assert_eq!(v["date"], "2025-01-07");
    assert_eq!(v["g1_net"], 3);
    assert_eq!(v["cot_index_g2_1y"], 100.0);
    assert_eq!(v["crowded_g2"]["signal"], "BUY");
    assert!(v.get("g4_net").is_none());
}

proptest! {
    #[test]
    fn indices_stay_within_bounds(nets in prop::collection::vec(prop::option::of(-50_000i64..50_000), 1..80)) {
        let input: Vec<Option<f64>> = nets.iter().map(|n| n.map(|v| v as f64)).collect();
        let out = Calculator::default().compute(&series(&input), ReportType::Legacy);
        for week in &out.weeks {
            for g in &week.groups {
                for idx in [g.cot_index_3m, g.cot_index_1y, g.cot_index_3y, g.wci].into_iter().flatten() {
                    prop_assert!((0.0..=100.0).contains(&idx));
                }
            }
        }
    }

    #[test]
    fn thresholds_only_change_signals(
        nets in prop::collection::vec(prop::option::of(-1_000i64..1_000), 1..40),
        sell in 0.0f64..50.0,
        buy in 50.5f64..100.0,
    ) {
        let input: Vec<Option<f64>> = nets.iter().map(|n| n.map(|v| v as f64)).collect();
        let records = series(&input);
        let base = Calculator::default().compute(&records, ReportType::Legacy);
        let tuned = Calculator::new(CalculatorConfig {
            buy_threshold: buy,
            sell_threshold: sell,
            ..CalculatorConfig::default()
        })
        .compute(&records, ReportType::Legacy);
        for (a, b) in base.weeks.iter().zip(&tuned.weeks) {
            for (ga, gb) in a.groups.iter().zip(&b.groups) {
                prop_assert_eq!(ga.cot_index_1y, gb.cot_index_1y);
                prop_assert_eq!(ga.wci, gb.wci);
                prop_assert_eq!(ga.crowded.value, gb.crowded.value);
            }
        }
        prop_assert_eq!(base.stats, tuned.stats);
    }
}
