//! Source column layouts per report type.
//!
//! Each table lists the published columns in file order. Yearly archives carry the
//! names in a header row; current-week files are headerless and bind by position,
//! so the order here must match the published layout up to the last bound column.

use crate::models::report::{GroupKey, ReportType};

/// A normalized field a source column feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    MarketName,
    DateYymmdd,
    DateIso,
    MarketCode,
    ExchangeCode,
    CommodityCode,
    OpenInterest,
    OpenInterestChange,
    TotalReptLong,
    TotalReptShort,
    Group(GroupKey, GroupField),
}

/// A per-group measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupField {
    Long,
    Short,
    Spread,
    LongChange,
    ShortChange,
    SpreadChange,
    PctLong,
    PctShort,
    PctSpread,
}

/// One source column.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub name: &'static str,
    pub field: Option<Field>,
}

const fn col(name: &'static str, field: Field) -> Column {
    Column {
        name,
        field: Some(field),
    }
}

const fn skip(name: &'static str) -> Column {
    Column { name, field: None }
}

const fn g(key: GroupKey, field: GroupField) -> Field {
    Field::Group(key, field)
}

use Field::*;
use GroupField::*;
use GroupKey::*;

/// Ordered layout for a report type.
pub fn layout(report_type: ReportType) -> &'static [Column] {
    match report_type {
        ReportType::Legacy => LEGACY,
        ReportType::Disaggregated => DISAGG,
        ReportType::FinancialFutures => TFF,
    }
}

static LEGACY: &[Column] = &[
    col("Market and Exchange Names", MarketName),
    col("As of Date in Form YYMMDD", DateYymmdd),
    col("As of Date in Form YYYY-MM-DD", DateIso),
    col("CFTC Contract Market Code", MarketCode),
    col("CFTC Market Code in Initials", ExchangeCode),
    skip("CFTC Region Code"),
    col("CFTC Commodity Code", CommodityCode),
    col("Open Interest (All)", OpenInterest),
    col("Noncommercial Positions-Long (All)", g(G1, Long)),
    col("Noncommercial Positions-Short (All)", g(G1, Short)),
    col("Noncommercial Positions-Spreading (All)", g(G1, Spread)),
    col("Commercial Positions-Long (All)", g(G2, Long)),
    col("Commercial Positions-Short (All)", g(G2, Short)),
    col("Total Reportable Positions-Long (All)", TotalReptLong),
    col("Total Reportable Positions-Short (All)", TotalReptShort),
    col("Nonreportable Positions-Long (All)", g(G3, Long)),
    col("Nonreportable Positions-Short (All)", g(G3, Short)),
    skip("Open Interest (Old)"),
    skip("Noncommercial Positions-Long (Old)"),
    skip("Noncommercial Positions-Short (Old)"),
    skip("Noncommercial Positions-Spreading (Old)"),
    skip("Commercial Positions-Long (Old)"),
    skip("Commercial Positions-Short (Old)"),
    skip("Total Reportable Positions-Long (Old)"),
    skip("Total Reportable Positions-Short (Old)"),
    skip("Nonreportable Positions-Long (Old)"),
    skip("Nonreportable Positions-Short (Old)"),
    skip("Open Interest (Other)"),
    skip("Noncommercial Positions-Long (Other)"),
    skip("Noncommercial Positions-Short (Other)"),
    skip("Noncommercial Positions-Spreading (Other)"),
    skip("Commercial Positions-Long (Other)"),
    skip("Commercial Positions-Short (Other)"),
    skip("Total Reportable Positions-Long (Other)"),
    skip("Total Reportable Positions-Short (Other)"),
    skip("Nonreportable Positions-Long (Other)"),
    skip("Nonreportable Positions-Short (Other)"),
    col("Change in Open Interest (All)", OpenInterestChange),
    col("Change in Noncommercial-Long (All)", g(G1, LongChange)),
    col("Change in Noncommercial-Short (All)", g(G1, ShortChange)),
    col("Change in Noncommercial-Spreading (All)", g(G1, SpreadChange)),
    col("Change in Commercial-Long (All)", g(G2, LongChange)),
    col("Change in Commercial-Short (All)", g(G2, ShortChange)),
    skip("Change in Total Reportable-Long (All)"),
    skip("Change in Total Reportable-Short (All)"),
    col("Change in Nonreportable-Long (All)", g(G3, LongChange)),
    col("Change in Nonreportable-Short (All)", g(G3, ShortChange)),
    skip("% of Open Interest (OI) (All)"),
    col("% of OI-Noncommercial-Long (All)", g(G1, PctLong)),
    col("% of OI-Noncommercial-Short (All)", g(G1, PctShort)),
    col("% of OI-Noncommercial-Spreading (All)", g(G1, PctSpread)),
    col("% of OI-Commercial-Long (All)", g(G2, PctLong)),
    col("% of OI-Commercial-Short (All)", g(G2, PctShort)),
    skip("% of OI-Total Reportable-Long (All)"),
    skip("% of OI-Total Reportable-Short (All)"),
    col("% of OI-Nonreportable-Long (All)", g(G3, PctLong)),
    col("% of OI-Nonreportable-Short (All)", g(G3, PctShort)),
];

static DISAGG: &[Column] = &[
    col("Market_and_Exchange_Names", MarketName),
    col("As_of_Date_In_Form_YYMMDD", DateYymmdd),
    col("Report_Date_as_YYYY-MM-DD", DateIso),
    col("CFTC_Contract_Market_Code", MarketCode),
    col("CFTC_Market_Code", ExchangeCode),
    skip("CFTC_Region_Code"),
    col("CFTC_Commodity_Code", CommodityCode),
    col("Open_Interest_All", OpenInterest),
    col("Prod_Merc_Positions_Long_All", g(G1, Long)),
    col("Prod_Merc_Positions_Short_All", g(G1, Short)),
    col("Swap_Positions_Long_All", g(G2, Long)),
    col("Swap__Positions_Short_All", g(G2, Short)),
    col("Swap__Positions_Spread_All", g(G2, Spread)),
    col("M_Money_Positions_Long_All", g(G3, Long)),
    col("M_Money_Positions_Short_All", g(G3, Short)),
    col("M_Money_Positions_Spread_All", g(G3, Spread)),
    col("Other_Rept_Positions_Long_All", g(G4, Long)),
    col("Other_Rept_Positions_Short_All", g(G4, Short)),
    col("Other_Rept_Positions_Spread_All", g(G4, Spread)),
    col("Tot_Rept_Positions_Long_All", TotalReptLong),
    col("Tot_Rept_Positions_Short_All", TotalReptShort),
    col("NonRept_Positions_Long_All", g(G5, Long)),
    col("NonRept_Positions_Short_All", g(G5, Short)),
    skip("Open_Interest_Old"),
    skip("Prod_Merc_Positions_Long_Old"),
    skip("Prod_Merc_Positions_Short_Old"),
    skip("Swap_Positions_Long_Old"),
    skip("Swap__Positions_Short_Old"),
    skip("Swap__Positions_Spread_Old"),
    skip("M_Money_Positions_Long_Old"),
    skip("M_Money_Positions_Short_Old"),
    skip("M_Money_Positions_Spread_Old"),
    skip("Other_Rept_Positions_Long_Old"),
    skip("Other_Rept_Positions_Short_Old"),
    skip("Other_Rept_Positions_Spread_Old"),
    skip("Tot_Rept_Positions_Long_Old"),
    skip("Tot_Rept_Positions_Short_Old"),
    skip("NonRept_Positions_Long_Old"),
    skip("NonRept_Positions_Short_Old"),
    skip("Open_Interest_Other"),
    skip("Prod_Merc_Positions_Long_Other"),
    skip("Prod_Merc_Positions_Short_Other"),
    skip("Swap_Positions_Long_Other"),
    skip("Swap__Positions_Short_Other"),
    skip("Swap__Positions_Spread_Other"),
    skip("M_Money_Positions_Long_Other"),
    skip("M_Money_Positions_Short_Other"),
    skip("M_Money_Positions_Spread_Other"),
    skip("Other_Rept_Positions_Long_Other"),
    skip("Other_Rept_Positions_Short_Other"),
    skip("Other_Rept_Positions_Spread_Other"),
    skip("Tot_Rept_Positions_Long_Other"),
    skip("Tot_Rept_Positions_Short_Other"),
    skip("NonRept_Positions_Long_Other"),
    skip("NonRept_Positions_Short_Other"),
    col("Change_in_Open_Interest_All", OpenInterestChange),
    col("Change_in_Prod_Merc_Long_All", g(G1, LongChange)),
    col("Change_in_Prod_Merc_Short_All", g(G1, ShortChange)),
    col("Change_in_Swap_Long_All", g(G2, LongChange)),
    col("Change_in_Swap_Short_All", g(G2, ShortChange)),
    col("Change_in_Swap_Spread_All", g(G2, SpreadChange)),
    col("Change_in_M_Money_Long_All", g(G3, LongChange)),
    col("Change_in_M_Money_Short_All", g(G3, ShortChange)),
    col("Change_in_M_Money_Spread_All", g(G3, SpreadChange)),
    col("Change_in_Other_Rept_Long_All", g(G4, LongChange)),
    col("Change_in_Other_Rept_Short_All", g(G4, ShortChange)),
    col("Change_in_Other_Rept_Spread_All", g(G4, SpreadChange)),
    skip("Change_in_Tot_Rept_Long_All"),
    skip("Change_in_Tot_Rept_Short_All"),
    col("Change_in_NonRept_Long_All", g(G5, LongChange)),
    col("Change_in_NonRept_Short_All", g(G5, ShortChange)),
    skip("Pct_of_Open_Interest_All"),
    col("Pct_of_OI_Prod_Merc_Long_All", g(G1, PctLong)),
    col("Pct_of_OI_Prod_Merc_Short_All", g(G1, PctShort)),
    col("Pct_of_OI_Swap_Long_All", g(G2, PctLong)),
    col("Pct_of_OI_Swap_Short_All", g(G2, PctShort)),
    col("Pct_of_OI_Swap_Spread_All", g(G2, PctSpread)),
    col("Pct_of_OI_M_Money_Long_All", g(G3, PctLong)),
    col("Pct_of_OI_M_Money_Short_All", g(G3, PctShort)),
    col("Pct_of_OI_M_Money_Spread_All", g(G3, PctSpread)),
    col("Pct_of_OI_Other_Rept_Long_All", g(G4, PctLong)),
    col("Pct_of_OI_Other_Rept_Short_All", g(G4, PctShort)),
    col("Pct_of_OI_Other_Rept_Spread_All", g(G4, PctSpread)),
    skip("Pct_of_OI_Tot_Rept_Long_All"),
    skip("Pct_of_OI_Tot_Rept_Short_All"),
    col("Pct_of_OI_NonRept_Long_All", g(G5, PctLong)),
    col("Pct_of_OI_NonRept_Short_All", g(G5, PctShort)),
];

static TFF: &[Column] = &[
    col("Market_and_Exchange_Names", MarketName),
    col("As_of_Date_In_Form_YYMMDD", DateYymmdd),
    col("Report_Date_as_YYYY-MM-DD", DateIso),
    col("CFTC_Contract_Market_Code", MarketCode),
    col("CFTC_Market_Code", ExchangeCode),
    skip("CFTC_Region_Code"),
    col("CFTC_Commodity_Code", CommodityCode),
    col("Open_Interest_All", OpenInterest),
    col("Dealer_Positions_Long_All", g(G1, Long)),
    col("Dealer_Positions_Short_All", g(G1, Short)),
    col("Dealer_Positions_Spread_All", g(G1, Spread)),
    col("Asset_Mgr_Positions_Long_All", g(G2, Long)),
    col("Asset_Mgr_Positions_Short_All", g(G2, Short)),
    col("Asset_Mgr_Positions_Spread_All", g(G2, Spread)),
    col("Lev_Money_Positions_Long_All", g(G3, Long)),
    col("Lev_Money_Positions_Short_All", g(G3, Short)),
    col("Lev_Money_Positions_Spread_All", g(G3, Spread)),
    col("Other_Rept_Positions_Long_All", g(G4, Long)),
    col("Other_Rept_Positions_Short_All", g(G4, Short)),
    col("Other_Rept_Positions_Spread_All", g(G4, Spread)),
    col("Tot_Rept_Positions_Long_All", TotalReptLong),
    col("Tot_Rept_Positions_Short_All", TotalReptShort),
    col("NonRept_Positions_Long_All", g(G5, Long)),
    col("NonRept_Positions_Short_All", g(G5, Short)),
    col("Change_in_Open_Interest_All", OpenInterestChange),
    col("Change_in_Dealer_Long_All", g(G1, LongChange)),
    col("Change_in_Dealer_Short_All", g(G1, ShortChange)),
    col("Change_in_Dealer_Spread_All", g(G1, SpreadChange)),
    col("Change_in_Asset_Mgr_Long_All", g(G2, LongChange)),
    col("Change_in_Asset_Mgr_Short_All", g(G2, ShortChange)),
    col("Change_in_Asset_Mgr_Spread_All", g(G2, SpreadChange)),
    col("Change_in_Lev_Money_Long_All", g(G3, LongChange)),
    col("Change_in_Lev_Money_Short_All", g(G3, ShortChange)),
    col("Change_in_Lev_Money_Spread_All", g(G3, SpreadChange)),
    col("Change_in_Other_Rept_Long_All", g(G4, LongChange)),
    col("Change_in_Other_Rept_Short_All", g(G4, ShortChange)),
    col("Change_in_Other_Rept_Spread_All", g(G4, SpreadChange)),
    skip("Change_in_Tot_Rept_Long_All"),
    skip("Change_in_Tot_Rept_Short_All"),
    col("Change_in_NonRept_Long_All", g(G5, LongChange)),
    col("Change_in_NonRept_Short_All", g(G5, ShortChange)),
    skip("Pct_of_Open_Interest_All"),
    col("Pct_of_OI_Dealer_Long_All", g(G1, PctLong)),
    col("Pct_of_OI_Dealer_Short_All", g(G1, PctShort)),
    col("Pct_of_OI_Dealer_Spread_All", g(G1, PctSpread)),
    col("Pct_of_OI_Asset_Mgr_Long_All", g(G2, PctLong)),
    col("Pct_of_OI_Asset_Mgr_Short_All", g(G2, PctShort)),
    col("Pct_of_OI_Asset_Mgr_Spread_All", g(G2, PctSpread)),
    col("Pct_of_OI_Lev_Money_Long_All", g(G3, PctLong)),
    col("Pct_of_OI_Lev_Money_Short_All", g(G3, PctShort)),
    col("Pct_of_OI_Lev_Money_Spread_All", g(G3, PctSpread)),
    col("Pct_of_OI_Other_Rept_Long_All", g(G4, PctLong)),
    col("Pct_of_OI_Other_Rept_Short_All", g(G4, PctShort)),
    col("Pct_of_OI_Other_Rept_Spread_All", g(G4, PctSpread)),
    skip("Pct_of_OI_Tot_Rept_Long_All"),
    skip("Pct_of_OI_Tot_Rept_Short_All"),
    col("Pct_of_OI_NonRept_Long_All", g(G5, PctLong)),
    col("Pct_of_OI_NonRept_Short_All", g(G5, PctShort)),
];
