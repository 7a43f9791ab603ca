mod common;

use common::{LEGACY_CO, LEGACY_FO, TestDb, assert_sqlite_pragmas, date, record, setup_db, weekly};
use cot_ingestor::models::report::ReportType;
use cot_sync::db::connection::connect_sqlite;

#[test]
fn sqlite_connection_applies_pragmas() {
    let (db, mut conn) = setup_db();
    assert_sqlite_pragmas(&mut conn);

    let mut second = connect_sqlite(&db.path).expect("connect second");
    assert_sqlite_pragmas(&mut second);
}

#[test]
fn upsert_is_idempotent() {
    let db = TestDb::new();
    let mut store = db.open_store();
    let records: Vec<_> = weekly(date(2024, 1, 2), 10)
        .into_iter()
        .enumerate()
        .map(|(i, d)| record(LEGACY_FO, "088691", "GOLD - COMMODITY EXCHANGE INC.", d, i as f64))
        .collect();

    assert_eq!(store.upsert(&records).unwrap(), 10);
    let once = store.get_variant_stats(Some(ReportType::Legacy), None).unwrap();
    store.upsert(&records).unwrap();
    let twice = store.get_variant_stats(Some(ReportType::Legacy), None).unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.total_records, 10);
    assert_eq!(twice.total_markets, 1);
    assert_eq!(twice.first_date, Some(date(2024, 1, 2)));
}

#[test]
fn upsert_replaces_revised_rows() {
    let db = TestDb::new();
    let mut store = db.open_store();
    let day = date(2024, 6, 4);
    store
        .upsert(&[record(LEGACY_FO, "088691", "GOLD", day, 1.0)])
        .unwrap();
    store
        .upsert(&[record(LEGACY_FO, "088691", "GOLD", day, 7.0)])
        .unwrap();

    let series = store.get_market_series("088691", LEGACY_FO).unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0].open_interest, Some(1_007.0));
}

#[test]
fn market_series_is_newest_first_and_variant_scoped() {
    let db = TestDb::new();
    let mut store = db.open_store();
    let days = weekly(date(2024, 1, 2), 3);
    let mut records: Vec<_> = days
        .iter()
        .map(|d| record(LEGACY_FO, "088691", "GOLD", *d, 0.0))
        .collect();
    records.push(record(LEGACY_CO, "088691", "GOLD", days[0], 0.0));
    store.upsert(&records).unwrap();

    let series = store.get_market_series("088691", LEGACY_FO).unwrap();
    let dates: Vec<_> = series.iter().map(|r| r.report_date).collect();
    assert_eq!(dates, vec![days[2], days[1], days[0]]);
    assert_eq!(store.get_market_series("088691", LEGACY_CO).unwrap().len(), 1);
}

#[test]
fn markets_are_listed_by_name_with_newest_metadata() {
    let db = TestDb::new();
    let mut store = db.open_store();
    store
        .upsert(&[
            record(LEGACY_FO, "099741", "EURO FX", date(2024, 1, 2), 0.0),
            record(LEGACY_FO, "088691", "GOLD (OLD NAME)", date(2024, 1, 2), 0.0),
            record(LEGACY_FO, "088691", "GOLD", date(2024, 1, 9), 0.0),
        ])
        .unwrap();

    let markets = store.get_all_markets_for_variant(LEGACY_FO).unwrap();
    let names: Vec<_> = markets.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["EURO FX", "GOLD"]);
}

#[test]
fn pages_cover_every_market_once() {
    let db = TestDb::new();
    let mut store = db.open_store();
    let mut records = Vec::new();
    for i in 0..5 {
        let code = format!("00000{i}");
        let name = format!("MARKET {i}");
        for d in weekly(date(2024, 1, 2), 2) {
            records.push(record(LEGACY_FO, &code, &name, d, 0.0));
        }
    }
    store.upsert(&records).unwrap();

    let first = store.get_variant_page(LEGACY_FO, 2, 0).unwrap();
    let second = store.get_variant_page(LEGACY_FO, 2, 2).unwrap();
    let last = store.get_variant_page(LEGACY_FO, 2, 4).unwrap();
    let beyond = store.get_variant_page(LEGACY_FO, 2, 6).unwrap();

    assert_eq!((first.len(), second.len(), last.len(), beyond.len()), (2, 2, 1, 0));
    assert_eq!(first[0].market.code, "000000");
    assert_eq!(last[0].market.code, "000004");
    assert!(first.iter().all(|s| s.records.len() == 2));

    let bulk = store.get_bulk_for_variant(LEGACY_FO).unwrap();
    assert_eq!(bulk.len(), 5);
}

#[test]
fn series_follow_the_given_market_list() {
    let db = TestDb::new();
    let mut store = db.open_store();
    let mut records = Vec::new();
    for d in weekly(date(2024, 1, 2), 3) {
        records.push(record(LEGACY_FO, "088691", "GOLD", d, 0.0));
        records.push(record(LEGACY_FO, "099741", "EURO FX", d, 0.0));
    }
    records.push(record(LEGACY_CO, "084691", "SILVER", date(2024, 1, 2), 0.0));
    store.upsert(&records).unwrap();

    let mut markets = store.get_all_markets_for_variant(LEGACY_FO).unwrap();
    markets.reverse();
    let mut silver = markets[0].clone();
    silver.code = "084691".into();
    markets.push(silver);

    let series = store.get_series_for_markets(LEGACY_FO, &markets).unwrap();
    let codes: Vec<_> = series.iter().map(|s| s.market.code.as_str()).collect();
    assert_eq!(codes, ["088691", "099741", "084691"]);
    assert_eq!(series[0].records.len(), 3);
    assert_eq!(series[0].records[0].report_date, date(2024, 1, 16));
    // Silver only has combined rows.
    assert!(series[2].records.is_empty());
    assert!(store.get_series_for_markets(LEGACY_FO, &[]).unwrap().is_empty());
}

#[test]
fn delete_variant_clears_records_and_ledger() {
    let db = TestDb::new();
    let mut store = db.open_store();
    store
        .upsert(&[
            record(LEGACY_FO, "088691", "GOLD", date(2024, 1, 2), 0.0),
            record(LEGACY_CO, "088691", "GOLD", date(2024, 1, 2), 0.0),
        ])
        .unwrap();
    store.record_year_ingested(LEGACY_FO, 2024, 1).unwrap();
    store.record_year_ingested(LEGACY_CO, 2024, 1).unwrap();

    assert_eq!(store.delete_variant(LEGACY_FO).unwrap(), 1);

    assert!(store.get_market_series("088691", LEGACY_FO).unwrap().is_empty());
    assert!(!store.is_year_ingested(LEGACY_FO, 2024).unwrap());
    assert!(store.is_year_ingested(LEGACY_CO, 2024).unwrap());
    assert_eq!(store.get_variant_stats(None, None).unwrap().total_records, 1);
}

#[test]
fn ledger_entries_replace_earlier_ones() {
    let db = TestDb::new();
    let mut store = db.open_store();
    store.record_year_ingested(LEGACY_FO, 2023, 10).unwrap();
    store.record_year_ingested(LEGACY_FO, 2024, 20).unwrap();
    store.record_year_ingested(LEGACY_FO, 2024, 25).unwrap();

    let years: Vec<_> = store.ingested_years(LEGACY_FO).unwrap().into_iter().collect();
    assert_eq!(years, vec![2023, 2024]);
    let ledger = store.ledger(LEGACY_FO).unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[1].row_count, 25);
}

#[test]
fn empty_store_has_no_latest_date() {
    let db = TestDb::new();
    let mut store = db.open_store();
    assert_eq!(store.latest_date(None).unwrap(), None);
    assert_eq!(
        store.get_variant_stats(None, None).unwrap().total_records,
        0
    );
}

#[test]
fn stored_prices_replace_per_market_and_keep_fetch_time() {
    use chrono::{TimeZone, Utc};
    use cot_ingestor::models::price::PriceBar;
    use cot_sync::prices::PriceData;

    let bar = |day, close| PriceBar {
        date: day,
        open: 1.0,
        high: 2.0,
        low: 0.5,
        close,
        volume: 7,
    };
    let db = TestDb::new();
    let mut store = db.open_store();
    let monday = Utc.with_ymd_and_hms(2025, 1, 6, 0, 0, 0).unwrap();

    let mut data = PriceData::new();
    data.insert("088691".into(), vec![bar(date(2025, 1, 3), 10.0), bar(date(2025, 1, 2), 9.0)]);
    data.insert("001602".into(), vec![bar(date(2025, 1, 3), 5.0)]);
    assert_eq!(store.save_prices(&data, monday).unwrap(), 3);

    let mut refreshed = PriceData::new();
    refreshed.insert("088691".into(), vec![bar(date(2025, 1, 6), 11.0)]);
    let tuesday = monday + chrono::Duration::days(1);
    store.save_prices(&refreshed, tuesday).unwrap();

    let codes = vec!["001602".to_string(), "088691".to_string(), "999999".to_string()];
    let stored = store.load_prices(&codes).unwrap();
    assert_eq!(stored.keys().collect::<Vec<_>>(), ["001602", "088691"]);
    assert_eq!(stored["001602"].fetched_at, monday);
    assert_eq!(stored["088691"].fetched_at, tuesday);
    assert_eq!(stored["088691"].bars, vec![bar(date(2025, 1, 6), 11.0)]);
    assert_eq!(stored["001602"].bars[0].volume, 7);
}
