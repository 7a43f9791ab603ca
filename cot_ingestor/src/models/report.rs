//! Report variants and the static trader-group tables.
//!
//! Every report type shares the generic `g1`..`g5` record layout. Which slots are
//! populated, and what each slot means, lives only in [`ReportType::groups`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The published report family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportType {
    /// Commercial / non-commercial split.
    #[serde(rename = "legacy")]
    Legacy,
    /// Disaggregated report (producer, swap, managed money, other).
    #[serde(rename = "disagg")]
    Disaggregated,
    /// Traders in Financial Futures.
    #[serde(rename = "tff")]
    FinancialFutures,
}

/// Futures-only or futures with options combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SubType {
    /// Futures only.
    #[serde(rename = "fo")]
    FuturesOnly,
    /// Futures and options combined.
    #[serde(rename = "co")]
    Combined,
}

/// Error returned when a report or sub-type code is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} code: {code:?}")]
pub struct UnknownCodeError {
    /// Which enum was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub code: String,
}

impl ReportType {
    /// All report types in processing order.
    pub const ALL: [ReportType; 3] = [
        ReportType::Legacy,
        ReportType::Disaggregated,
        ReportType::FinancialFutures,
    ];

    /// Short code used in file names and the store.
    pub fn code(self) -> &'static str {
        match self {
            ReportType::Legacy => "legacy",
            ReportType::Disaggregated => "disagg",
            ReportType::FinancialFutures => "tff",
        }
    }

    /// Human readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            ReportType::Legacy => "Legacy",
            ReportType::Disaggregated => "Disaggregated",
            ReportType::FinancialFutures => "Traders in Financial Futures",
        }
    }

    /// Ordered trader groups published for this report type.
    pub fn groups(self) -> &'static [GroupDef] {
        match self {
            ReportType::Legacy => LEGACY_GROUPS,
            ReportType::Disaggregated => DISAGG_GROUPS,
            ReportType::FinancialFutures => TFF_GROUPS,
        }
    }
}

impl SubType {
    /// All sub-types in processing order.
    pub const ALL: [SubType; 2] = [SubType::FuturesOnly, SubType::Combined];

    /// Short code used in file names and the store.
    pub fn code(self) -> &'static str {
        match self {
            SubType::FuturesOnly => "fo",
            SubType::Combined => "co",
        }
    }

    /// Human readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            SubType::FuturesOnly => "Futures Only",
            SubType::Combined => "Futures + Options Combined",
        }
    }
}

impl FromStr for ReportType {
    type Err = UnknownCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" => Ok(ReportType::Legacy),
            "disagg" | "disaggregated" => Ok(ReportType::Disaggregated),
            "tff" => Ok(ReportType::FinancialFutures),
            _ => Err(UnknownCodeError {
                kind: "report type",
                code: s.to_string(),
            }),
        }
    }
}

impl FromStr for SubType {
    type Err = UnknownCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fo" => Ok(SubType::FuturesOnly),
            "co" => Ok(SubType::Combined),
            _ => Err(UnknownCodeError {
                kind: "sub-type",
                code: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for SubType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A (report type, sub-type) pair. Each variant is ingested and exported independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variant {
    /// Report family.
    pub report_type: ReportType,
    /// Futures-only or combined.
    pub sub_type: SubType,
}

impl Variant {
    /// Builds a variant.
    pub const fn new(report_type: ReportType, sub_type: SubType) -> Self {
        Self {
            report_type,
            sub_type,
        }
    }

    /// Every variant, report type major.
    pub fn all() -> impl Iterator<Item = Variant> {
        ReportType::ALL
            .into_iter()
            .flat_map(|rt| SubType::ALL.into_iter().map(move |st| Variant::new(rt, st)))
    }

    /// Variants matching optional filters.
    pub fn selected(report_type: Option<ReportType>, sub_type: Option<SubType>) -> Vec<Variant> {
        Variant::all()
            .filter(|v| report_type.is_none_or(|rt| rt == v.report_type))
            .filter(|v| sub_type.is_none_or(|st| st == v.sub_type))
            .collect()
    }

    /// Key like `legacy_fo`, used in status maps and file names.
    pub fn key(&self) -> String {
        format!("{}_{}", self.report_type.code(), self.sub_type.code())
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.report_type, self.sub_type)
    }
}

/// Generic trader-group slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKey {
    /// Slot 1.
    G1,
    /// Slot 2.
    G2,
    /// Slot 3.
    G3,
    /// Slot 4.
    G4,
    /// Slot 5.
    G5,
}

impl GroupKey {
    /// All slots in order.
    pub const ALL: [GroupKey; 5] = [
        GroupKey::G1,
        GroupKey::G2,
        GroupKey::G3,
        GroupKey::G4,
        GroupKey::G5,
    ];

    /// Zero-based slot index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column prefix, `g1`..`g5`.
    pub fn as_str(self) -> &'static str {
        match self {
            GroupKey::G1 => "g1",
            GroupKey::G2 => "g2",
            GroupKey::G3 => "g3",
            GroupKey::G4 => "g4",
            GroupKey::G5 => "g5",
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market role of a trader group. Drives the direction of the crowding signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraderRole {
    /// Hedgers; extreme long positioning is read as bullish.
    Commercial,
    /// Large speculators; read contrarian.
    Speculative,
    /// Non-reportable traders; read contrarian.
    Small,
}

/// Static description of one trader group within a report type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupDef {
    /// Slot the group occupies.
    pub key: GroupKey,
    /// Display name.
    pub name: &'static str,
    /// Abbreviation used in signal lists.
    pub short: &'static str,
    /// Role used for signal direction.
    pub role: TraderRole,
    /// Whether the group reports spreading positions.
    pub has_spread: bool,
}

const fn group(
    key: GroupKey,
    name: &'static str,
    short: &'static str,
    role: TraderRole,
    has_spread: bool,
) -> GroupDef {
    GroupDef {
        key,
        name,
        short,
        role,
        has_spread,
    }
}

static LEGACY_GROUPS: &[GroupDef] = &[
    group(GroupKey::G1, "Large Speculators", "L.S", TraderRole::Speculative, true),
    group(GroupKey::G2, "Commercials", "Comm", TraderRole::Commercial, false),
    group(GroupKey::G3, "Small Traders", "ST", TraderRole::Small, false),
];

static DISAGG_GROUPS: &[GroupDef] = &[
    group(GroupKey::G1, "Producer/Merchant", "PM", TraderRole::Commercial, false),
    group(GroupKey::G2, "Swap Dealers", "SD", TraderRole::Commercial, true),
    group(GroupKey::G3, "Managed Money", "MM", TraderRole::Speculative, true),
    group(GroupKey::G4, "Other Reportables", "OR", TraderRole::Speculative, true),
    group(GroupKey::G5, "Non-Reportable", "NR", TraderRole::Small, false),
];

static TFF_GROUPS: &[GroupDef] = &[
    group(GroupKey::G1, "Dealer/Intermediary", "Dealer", TraderRole::Commercial, true),
    group(GroupKey::G2, "Asset Manager", "AM", TraderRole::Speculative, true),
    group(GroupKey::G3, "Leveraged Funds", "LevFn", TraderRole::Speculative, true),
    group(GroupKey::G4, "Other Reportables", "OR", TraderRole::Speculative, true),
    group(GroupKey::G5, "Non-Reportable", "NR", TraderRole::Small, false),
];

/// Directional read of a crowded position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    /// Positioning favours the long side.
    Buy,
    /// Positioning favours the short side.
    Sell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_from_str() {
        for v in Variant::all() {
            assert_eq!(v.report_type.code().parse::<ReportType>().unwrap(), v.report_type);
            assert_eq!(v.sub_type.code().parse::<SubType>().unwrap(), v.sub_type);
        }
        assert!("weekly".parse::<ReportType>().is_err());
    }

    #[test]
    fn there_are_six_variants() {
        let all: Vec<_> = Variant::all().collect();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].to_string(), "legacy/fo");
        assert_eq!(all[5].key(), "tff_co");
    }

    #[test]
    fn selection_filters_by_type_and_subtype() {
        let only_disagg = Variant::selected(Some(ReportType::Disaggregated), None);
        assert_eq!(only_disagg.len(), 2);
        let only_co = Variant::selected(None, Some(SubType::Combined));
        assert!(only_co.iter().all(|v| v.sub_type == SubType::Combined));
        assert_eq!(only_co.len(), 3);
    }

    #[test]
    fn legacy_has_three_groups_others_five() {
        assert_eq!(ReportType::Legacy.groups().len(), 3);
        assert_eq!(ReportType::Disaggregated.groups().len(), 5);
        assert_eq!(ReportType::FinancialFutures.groups().len(), 5);
        assert_eq!(ReportType::Legacy.groups()[1].role, TraderRole::Commercial);
    }

    #[test]
    fn group_def_serializes_like_the_groups_file() {
        let json = serde_json::to_value(ReportType::Legacy.groups()[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "key": "g1",
                "name": "Large Speculators",
                "short": "L.S",
                "role": "speculative",
                "has_spread": true
            })
        );
        assert_eq!(serde_json::to_value(Signal::Buy).unwrap(), "BUY");
    }
}
