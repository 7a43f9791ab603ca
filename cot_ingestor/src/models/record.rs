//! The normalized record shared by every report type.

use chrono::NaiveDate;

use crate::models::report::{GroupKey, ReportType, SubType, Variant};

/// Positions reported for one trader group.
///
/// All values are nullable: a report type that does not publish a group, or a source
/// cell that is blank or malformed, leaves the field as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupPositions {
    pub long: Option<f64>,
    pub short: Option<f64>,
    pub spread: Option<f64>,
    pub long_change: Option<f64>,
    pub short_change: Option<f64>,
    pub spread_change: Option<f64>,
    pub pct_long: Option<f64>,
    pub pct_short: Option<f64>,
    pub pct_spread: Option<f64>,
}

/// One market, one report date, one variant.
///
/// `(market_code, report_date, report_type, sub_type)` is the natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub report_type: ReportType,
    pub sub_type: SubType,
    pub report_date: NaiveDate,
    pub market_code: String,
    pub market_name: String,
    pub exchange_code: String,
    pub commodity_code: String,
    pub open_interest: Option<f64>,
    pub open_interest_change: Option<f64>,
    pub groups: [GroupPositions; 5],
    pub total_rept_long: Option<f64>,
    pub total_rept_short: Option<f64>,
}

impl NormalizedRecord {
    /// An otherwise empty record for the given key.
    pub fn new(variant: Variant, report_date: NaiveDate, market_code: impl Into<String>) -> Self {
        Self {
            report_type: variant.report_type,
            sub_type: variant.sub_type,
            report_date,
            market_code: market_code.into(),
            market_name: String::new(),
            exchange_code: String::new(),
            commodity_code: String::new(),
            open_interest: None,
            open_interest_change: None,
            groups: Default::default(),
            total_rept_long: None,
            total_rept_short: None,
        }
    }

    /// The variant this record belongs to.
    pub fn variant(&self) -> Variant {
        Variant::new(self.report_type, self.sub_type)
    }

    pub fn group(&self, key: GroupKey) -> &GroupPositions {
        &self.groups[key.index()]
    }

    pub fn group_mut(&mut self, key: GroupKey) -> &mut GroupPositions {
        &mut self.groups[key.index()]
    }
}
