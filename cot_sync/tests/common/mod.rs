#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use cot_ingestor::models::record::NormalizedRecord;
use cot_ingestor::models::report::{GroupKey, ReportType, SubType, Variant};
use cot_ingestor::parse::layout::{Field, GroupField, layout};
use cot_sync::db::{connection, migrate};
use cot_sync::store::CotStore;
use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use tempfile::TempDir;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const LEGACY_FO: Variant = Variant::new(ReportType::Legacy, SubType::FuturesOnly);
pub const LEGACY_CO: Variant = Variant::new(ReportType::Legacy, SubType::Combined);

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}

pub struct TestDb {
    pub dir: TempDir, // keep alive for the life of the test
    pub path: String, // <tmpdir>/cot.db
}

impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("cot.db").to_string_lossy().to_string();
        Self { dir, path }
    }

    pub fn child(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn open_store(&self) -> CotStore {
        CotStore::open(&self.path).expect("open store")
    }
}

pub fn setup_db() -> (TestDb, SqliteConnection) {
    let db = TestDb::new();
    migrate::run_sqlite(&db.path).expect("migrations");
    let conn = connection::connect_sqlite(&db.path).expect("connect");
    (db, conn)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, connection::BUSY_TIMEOUT_MS as i32);
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `count` consecutive weekly dates starting at `first`.
pub fn weekly(first: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count).map(|i| first + Duration::weeks(i as i64)).collect()
}

/// A legacy record with G1/G2 positions derived from `seed`.
pub fn record(variant: Variant, code: &str, name: &str, day: NaiveDate, seed: f64) -> NormalizedRecord {
    let mut r = NormalizedRecord::new(variant, day, code);
    r.market_name = name.to_string();
    r.exchange_code = "CMX".to_string();
    r.commodity_code = "088".to_string();
    r.open_interest = Some(1_000.0 + seed);
    r.open_interest_change = Some(seed);
    let g1 = r.group_mut(GroupKey::G1);
    g1.long = Some(500.0 + seed);
    g1.short = Some(200.0);
    let g2 = r.group_mut(GroupKey::G2);
    g2.long = Some(300.0);
    g2.short = Some(400.0 + seed);
    r
}

const ARCHIVE_HEADER: &str = "Market and Exchange Names,As of Date in Form YYYY-MM-DD,\
CFTC Contract Market Code,CFTC Market Code in Initials,CFTC Commodity Code,Open Interest (All),\
Noncommercial Positions-Long (All),Noncommercial Positions-Short (All),\
Commercial Positions-Long (All),Commercial Positions-Short (All)";

/// Legacy yearly archive text: one row per `(code, name, date, open_interest, g1_long)`.
pub fn legacy_archive(rows: &[(&str, &str, NaiveDate, f64, f64)]) -> String {
    let mut out = String::from(ARCHIVE_HEADER);
    out.push('\n');
    for (code, name, day, oi, g1_long) in rows {
        out.push_str(&format!(
            "{name},{day},{code},CMX,088,{oi},{g1_long},1000,2000,3000\n"
        ));
    }
    out
}

/// One headerless legacy current-week line, positioned per the legacy layout.
pub fn legacy_current_line(code: &str, name: &str, day: NaiveDate, oi: f64, g1_long: f64) -> String {
    let columns = layout(ReportType::Legacy);
    let mut cells = vec![String::new(); columns.len()];
    let mut set = |field: Field, value: String| {
        if let Some(idx) = columns.iter().position(|c| c.field == Some(field)) {
            cells[idx] = value;
        }
    };
    set(Field::MarketName, name.to_string());
    set(Field::DateIso, day.to_string());
    set(Field::MarketCode, code.to_string());
    set(Field::ExchangeCode, "CMX".to_string());
    set(Field::CommodityCode, "088".to_string());
    set(Field::OpenInterest, oi.to_string());
    set(Field::Group(GroupKey::G1, GroupField::Long), g1_long.to_string());
    format!("{}\n", cells.join(","))
}

pub fn zipped(name: &str, body: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(name, SimpleFileOptions::default()).unwrap();
    writer.write_all(body.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}
