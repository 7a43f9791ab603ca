use chrono::NaiveDate;
use cot_ingestor::models::record::NormalizedRecord;
use cot_ingestor::models::report::{GroupDef, GroupKey, Signal};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::analytics::{round_int, round1};

/// `{value, signal}` pair derived from the 1-year index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Crowded {
    pub value: Option<f64>,
    pub signal: Option<Signal>,
}

/// Derived values for one trader group in one week.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupWeek {
    pub key: GroupKey,
    pub long: Option<i64>,
    pub short: Option<i64>,
    pub net: Option<i64>,
    pub change: Option<i64>,
    pub change_long: Option<i64>,
    pub change_short: Option<i64>,
    pub pct_net_oi: Option<f64>,
    pub cot_index_3m: Option<f64>,
    pub cot_index_1y: Option<f64>,
    pub cot_index_3y: Option<f64>,
    pub wci: Option<f64>,
    pub crowded: Crowded,
}

/// One report period after calculation. Serializes to the flat `gX_*` shape of the
/// detail artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedWeek {
    pub date: NaiveDate,
    pub open_interest: Option<f64>,
    pub oi_change: Option<f64>,
    pub oi_pct: Option<f64>,
    /// In the report type's group order.
    pub groups: Vec<GroupWeek>,
}

impl ComputedWeek {
    pub fn group(&self, key: GroupKey) -> Option<&GroupWeek> {
        self.groups.iter().find(|g| g.key == key)
    }
}

fn diff(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

fn pct_of(value: Option<f64>, oi: Option<f64>) -> Option<f64> {
    let oi = oi.filter(|v| *v != 0.0)?;
    Some(round1(value? / oi * 100.0))
}

pub(crate) fn build_week(record: &NormalizedRecord, groups: &[GroupDef]) -> ComputedWeek {
    let oi = record.open_interest;
    let groups = groups
        .iter()
        .map(|def| {
            let p = record.group(def.key);
            let net = diff(p.long, p.short);
            GroupWeek {
                key: def.key,
                long: p.long.map(round_int),
                short: p.short.map(round_int),
                net: net.map(round_int),
                change: diff(p.long_change, p.short_change).map(round_int),
                change_long: p.long_change.map(round_int),
                change_short: p.short_change.map(round_int),
                pct_net_oi: pct_of(net, oi),
                cot_index_3m: None,
                cot_index_1y: None,
                cot_index_3y: None,
                wci: None,
                crowded: Crowded::default(),
            }
        })
        .collect();

    ComputedWeek {
        date: record.report_date,
        open_interest: oi,
        oi_change: record.open_interest_change,
        oi_pct: pct_of(record.open_interest_change, oi),
        groups,
    }
}

impl Serialize for ComputedWeek {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4 + self.groups.len() * 12))?;
        map.serialize_entry("date", &self.date)?;
        map.serialize_entry("open_interest", &self.open_interest)?;
        map.serialize_entry("oi_change", &self.oi_change)?;
        map.serialize_entry("oi_pct", &self.oi_pct)?;
        for g in &self.groups {
            let k = g.key.as_str();
            map.serialize_entry(&format!("{k}_long"), &g.long)?;
            map.serialize_entry(&format!("{k}_short"), &g.short)?;
            map.serialize_entry(&format!("{k}_net"), &g.net)?;
            map.serialize_entry(&format!("{k}_change"), &g.change)?;
            map.serialize_entry(&format!("{k}_change_long"), &g.change_long)?;
            map.serialize_entry(&format!("{k}_change_short"), &g.change_short)?;
            map.serialize_entry(&format!("{k}_pct_net_oi"), &g.pct_net_oi)?;
        }
        for g in &self.groups {
            let k = g.key.as_str();
            map.serialize_entry(&format!("cot_index_{k}_3m"), &g.cot_index_3m)?;
            map.serialize_entry(&format!("cot_index_{k}_1y"), &g.cot_index_1y)?;
            map.serialize_entry(&format!("cot_index_{k}_3y"), &g.cot_index_3y)?;
            map.serialize_entry(&format!("wci_{k}"), &g.wci)?;
            map.serialize_entry(&format!("crowded_{k}"), &g.crowded)?;
        }
        map.end()
    }
}
