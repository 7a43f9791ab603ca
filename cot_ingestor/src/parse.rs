//! Delimited-text parser for CFTC report files.
//!
//! Yearly archives carry a header row and bind columns by name; current-week files
//! are headerless and bind by position against the same [`layout`] table. Both paths
//! produce [`NormalizedRecord`]s in the generic `g1`..`g5` shape.
//!
//! Bad cells never fail a row: blank, `.`, and non-numeric values become `None`.
//! A row without a usable report date or market code is dropped silently. Rows the
//! CSV reader itself rejects are counted and logged up to [`MAX_LOGGED_ERRORS`].

pub mod layout;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{info, warn};

use crate::models::record::{GroupPositions, NormalizedRecord};
use crate::models::report::Variant;
use layout::{Column, Field, GroupField, layout};

/// Per-call cap on individually logged row errors.
pub const MAX_LOGGED_ERRORS: usize = 5;

/// Counts gathered while parsing one payload.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Successfully normalized rows.
    pub records: Vec<NormalizedRecord>,
    /// Rows skipped for a missing date or market code.
    pub dropped: usize,
    /// Rows the reader could not decode.
    pub errors: usize,
}

/// Parses a yearly archive member (header row present).
pub fn parse_archive(raw: &str, variant: Variant) -> Vec<NormalizedRecord> {
    parse_archive_outcome(raw, variant).records
}

/// Parses a current-week file (no header row).
pub fn parse_current_period(raw: &str, variant: Variant) -> Vec<NormalizedRecord> {
    parse_current_period_outcome(raw, variant).records
}

/// [`parse_archive`] with drop and error counts.
pub fn parse_archive_outcome(raw: &str, variant: Variant) -> ParseOutcome {
    let columns = layout(variant.report_type);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    let mut outcome = ParseOutcome::default();
    let bindings = match reader.headers() {
        Ok(headers) => bind_headers(headers, columns),
        Err(e) => {
            warn!(%variant, error = %e, "unreadable header row");
            outcome.errors += 1;
            return outcome;
        }
    };
    if !bindings.iter().any(|(_, f)| *f == Field::MarketCode) {
        warn!(%variant, "header row has no market code column");
    }

    for result in reader.records() {
        match result {
            Ok(row) => outcome.push(normalize_row(
                variant,
                bindings.iter().map(|&(idx, field)| (field, row.get(idx).unwrap_or(""))),
            )),
            Err(e) => outcome.record_error(variant, &e),
        }
    }
    outcome.finish(variant);
    outcome
}

/// [`parse_current_period`] with drop and error counts.
pub fn parse_current_period_outcome(raw: &str, variant: Variant) -> ParseOutcome {
    let columns = layout(variant.report_type);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.trim().as_bytes());

    let mut outcome = ParseOutcome::default();
    for result in reader.records() {
        match result {
            Ok(row) => {
                let cells = positional_cells(&row, columns.len());
                outcome.push(normalize_row(
                    variant,
                    columns.iter().zip(cells).filter_map(|(c, v)| c.field.map(|f| (f, v))),
                ));
            }
            Err(e) => outcome.record_error(variant, &e),
        }
    }
    outcome.finish(variant);
    outcome
}

impl ParseOutcome {
    fn push(&mut self, record: Option<NormalizedRecord>) {
        match record {
            Some(r) => self.records.push(r),
            None => self.dropped += 1,
        }
    }

    fn record_error(&mut self, variant: Variant, error: &csv::Error) {
        self.errors += 1;
        if self.errors <= MAX_LOGGED_ERRORS {
            warn!(%variant, %error, "row error");
        }
    }

    fn finish(&self, variant: Variant) {
        if self.errors > MAX_LOGGED_ERRORS {
            warn!(%variant, "... and {} more row errors", self.errors - MAX_LOGGED_ERRORS);
        }
        info!(
            %variant,
            parsed = self.records.len(),
            dropped = self.dropped,
            errors = self.errors,
            "parsed rows"
        );
    }
}

/// Resolves layout columns against a header row, by trimmed name.
fn bind_headers(headers: &StringRecord, columns: &[Column]) -> Vec<(usize, Field)> {
    let names: Vec<&str> = headers.iter().map(clean).collect();
    columns
        .iter()
        .filter_map(|c| {
            let field = c.field?;
            names.iter().position(|n| *n == c.name).map(|idx| (idx, field))
        })
        .collect()
}

/// Trailing blanks dropped, then padded or truncated to `width`.
fn positional_cells(row: &StringRecord, width: usize) -> Vec<&str> {
    let mut cells: Vec<&str> = row.iter().collect();
    while cells.last().is_some_and(|c| c.trim().is_empty()) {
        cells.pop();
    }
    cells.resize(width, "");
    cells
}

fn normalize_row<'a>(
    variant: Variant,
    cells: impl Iterator<Item = (Field, &'a str)>,
) -> Option<NormalizedRecord> {
    let mut iso = None;
    let mut yymmdd = None;
    let mut code = "";
    let mut name = "";
    let mut exchange = "";
    let mut commodity = "";
    let mut open_interest = None;
    let mut oi_change = None;
    let mut rept_long = None;
    let mut rept_short = None;
    let mut groups: [GroupPositions; 5] = Default::default();

    for (field, raw) in cells {
        let value = clean(raw);
        match field {
            Field::DateIso => iso = parse_date(value),
            Field::DateYymmdd => yymmdd = parse_date(value),
            Field::MarketCode => code = value,
            Field::MarketName => name = value,
            Field::ExchangeCode => exchange = value,
            Field::CommodityCode => commodity = value,
            Field::OpenInterest => open_interest = parse_number(value),
            Field::OpenInterestChange => oi_change = parse_number(value),
            Field::TotalReptLong => rept_long = parse_number(value),
            Field::TotalReptShort => rept_short = parse_number(value),
            Field::Group(key, measure) => {
                let slot = &mut groups[key.index()];
                let target = match measure {
                    GroupField::Long => &mut slot.long,
                    GroupField::Short => &mut slot.short,
                    GroupField::Spread => &mut slot.spread,
                    GroupField::LongChange => &mut slot.long_change,
                    GroupField::ShortChange => &mut slot.short_change,
                    GroupField::SpreadChange => &mut slot.spread_change,
                    GroupField::PctLong => &mut slot.pct_long,
                    GroupField::PctShort => &mut slot.pct_short,
                    GroupField::PctSpread => &mut slot.pct_spread,
                };
                *target = parse_number(value);
            }
        }
    }

    let report_date = iso.or(yymmdd)?;
    if code.is_empty() {
        return None;
    }

    let mut record = NormalizedRecord::new(variant, report_date, code);
    record.market_name = name.to_string();
    record.exchange_code = exchange.to_string();
    record.commodity_code = commodity.to_string();
    record.open_interest = open_interest;
    record.open_interest_change = oi_change;
    record.total_rept_long = rept_long;
    record.total_rept_short = rept_short;
    record.groups = groups;
    Some(record)
}

fn clean(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim()
}

/// Accepts `YYYY-MM-DD` or six-digit `YYMMDD` (read as 20YY).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let bytes = s.as_bytes();
    if bytes.len() == 10 && bytes[4] == b'-' && bytes[7] == b'-' {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").ok();
    }
    if bytes.len() == 6 && bytes.iter().all(u8::is_ascii_digit) {
        let yy: i32 = s[0..2].parse().ok()?;
        let mm: u32 = s[2..4].parse().ok()?;
        let dd: u32 = s[4..6].parse().ok()?;
        return NaiveDate::from_ymd_opt(2000 + yy, mm, dd);
    }
    None
}

/// Nullable numeric cell. Thousands separators are ignored.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s == "." {
        return None;
    }
    s.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}
