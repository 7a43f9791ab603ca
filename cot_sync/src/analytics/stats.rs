use indexmap::IndexMap;
use serde::Serialize;

use crate::analytics::{CalculatorConfig, ComputedWeek, round_int, round1};

/// Quantity summarized in the statistics blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKey {
    OpenInterest,
    OiChange,
    OiPct,
    Net(usize),
    Change(usize),
    ChangeLong(usize),
    ChangeShort(usize),
    PctNetOi(usize),
}

impl StatKey {
    /// Keys in artifact order for a report with `group_count` groups.
    pub fn all(group_count: usize) -> Vec<StatKey> {
        let mut keys = vec![StatKey::OpenInterest, StatKey::OiChange, StatKey::OiPct];
        for slot in 0..group_count {
            keys.extend([
                StatKey::Net(slot),
                StatKey::Change(slot),
                StatKey::ChangeLong(slot),
                StatKey::ChangeShort(slot),
                StatKey::PctNetOi(slot),
            ]);
        }
        keys
    }

    pub fn is_pct(self) -> bool {
        matches!(self, StatKey::OiPct | StatKey::PctNetOi(_))
    }

    fn name(self, week: &ComputedWeek) -> String {
        let group = |slot: usize| week.groups[slot].key.as_str();
        match self {
            StatKey::OpenInterest => "open_interest".to_owned(),
            StatKey::OiChange => "oi_change".to_owned(),
            StatKey::OiPct => "oi_pct".to_owned(),
            StatKey::Net(s) => format!("{}_net", group(s)),
            StatKey::Change(s) => format!("{}_change", group(s)),
            StatKey::ChangeLong(s) => format!("{}_change_long", group(s)),
            StatKey::ChangeShort(s) => format!("{}_change_short", group(s)),
            StatKey::PctNetOi(s) => format!("{}_pct_net_oi", group(s)),
        }
    }

    fn value(self, week: &ComputedWeek) -> Option<f64> {
        let int = |v: Option<i64>| v.map(|v| v as f64);
        match self {
            StatKey::OpenInterest => week.open_interest,
            StatKey::OiChange => week.oi_change,
            StatKey::OiPct => week.oi_pct,
            StatKey::Net(s) => int(week.groups[s].net),
            StatKey::Change(s) => int(week.groups[s].change),
            StatKey::ChangeLong(s) => int(week.groups[s].change_long),
            StatKey::ChangeShort(s) => int(week.groups[s].change_short),
            StatKey::PctNetOi(s) => week.groups[s].pct_net_oi,
        }
    }

    fn finish(self, v: f64) -> StatValue {
        if self.is_pct() {
            StatValue::Pct(round1(v))
        } else {
            StatValue::Int(round_int(v))
        }
    }
}

/// Percentages keep one decimal, everything else is a whole number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Pct(f64),
}

impl StatValue {
    pub fn as_f64(self) -> f64 {
        match self {
            StatValue::Int(v) => v as f64,
            StatValue::Pct(v) => v,
        }
    }
}

pub type StatBlock = IndexMap<String, Option<StatValue>>;

/// Summary blocks over the computed weeks. All blocks are empty when there were no weeks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub max: StatBlock,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub min: StatBlock,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub max_5y: StatBlock,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub min_5y: StatBlock,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub avg_13w: StatBlock,
}

impl Stats {
    pub fn is_empty(&self) -> bool {
        self.max.is_empty()
    }
}

#[derive(Clone, Copy)]
enum Reduce {
    Max,
    Min,
    Mean,
}

fn block(weeks: &[ComputedWeek], keys: &[StatKey], names: &[String], how: Reduce) -> StatBlock {
    keys.iter()
        .zip(names)
        .map(|(&key, name)| {
            let vals: Vec<f64> = weeks.iter().filter_map(|w| key.value(w)).collect();
            let reduced = match (how, vals.is_empty()) {
                (_, true) => None,
                (Reduce::Max, false) => vals.iter().copied().reduce(f64::max),
                (Reduce::Min, false) => vals.iter().copied().reduce(f64::min),
                (Reduce::Mean, false) => Some(vals.iter().sum::<f64>() / vals.len() as f64),
            };
            (name.clone(), reduced.map(|v| key.finish(v)))
        })
        .collect()
}

pub(crate) fn compute_stats(
    weeks: &[ComputedWeek],
    group_count: usize,
    config: &CalculatorConfig,
) -> Stats {
    let Some(first) = weeks.first() else {
        return Stats::default();
    };
    let keys = StatKey::all(group_count);
    let names: Vec<String> = keys.iter().map(|k| k.name(first)).collect();
    let recent = &weeks[..weeks.len().min(config.window_5y)];
    let avg = &weeks[..weeks.len().min(config.avg_window)];

    Stats {
        max: block(weeks, &keys, &names, Reduce::Max),
        min: block(weeks, &keys, &names, Reduce::Min),
        max_5y: block(recent, &keys, &names, Reduce::Max),
        min_5y: block(recent, &keys, &names, Reduce::Min),
        avg_13w: block(avg, &keys, &names, Reduce::Mean),
    }
}
