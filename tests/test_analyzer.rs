//! Tests for day loading, caching policy, statistics and store maintenance
//! through the [`Analyzer`] facade.

mod common;

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use common::{date, midnight, raw_day, standard_row, ts, Reply, ScriptedSource, SharedSource};
use common::{PRIMARY, SECONDARY};
use voltstorage_analyzer::config::{processed_key, raw_key};
use voltstorage_analyzer::queries::day_bounds;
use voltstorage_analyzer::{
    codec, Analyzer, AnalyzerError, MemoryStore, MonthSelector, Store, StoreKind,
};

fn analyzer(source: ScriptedSource, save_raw: bool) -> (Analyzer, Arc<ScriptedSource>) {
    let source = Arc::new(source);
    let analyzer = Analyzer::builder()
        .store(MemoryStore::new())
        .source(SharedSource(source.clone()))
        .devices(PRIMARY, SECONDARY)
        .save_raw_data(save_raw)
        .build()
        .unwrap();
    (analyzer, source)
}

fn both_full_days() -> ScriptedSource {
    ScriptedSource::new()
        .reply(PRIMARY, Reply::FullDay)
        .reply(SECONDARY, Reply::FullDay)
}

fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    ts(y, m, d, 12, 0, 0)
}

fn store(analyzer: &Analyzer) -> &dyn Store {
    analyzer.backend().store()
}

// ---------------------------------------------------------------------------
// Day loading and caching
// ---------------------------------------------------------------------------

#[test]
fn past_day_is_fetched_once_and_stored() {
    let (analyzer, source) = analyzer(both_full_days(), false);
    let day = date(2021, 5, 15);

    let data = analyzer.days().load_as_of(day, noon(2021, 5, 20)).unwrap().unwrap();
    assert_eq!(data.len(), 1440);
    assert_eq!(data[0].time, midnight(day));
    assert_eq!(data[0].power_pv, Some(600));
    assert_eq!(data[0].battery1_to, Some(200));
    assert_eq!(data[0].battery2_to, Some(200));
    assert_eq!(source.calls().len(), 2);
    assert!(store(&analyzer).get(&processed_key(day)).unwrap().is_some());

    let again = analyzer.days().load_as_of(day, noon(2021, 5, 20)).unwrap().unwrap();
    assert_eq!(again, data);
    assert_eq!(source.calls().len(), 2);
}

#[test]
fn fetch_covers_the_whole_utc_day() {
    let (analyzer, source) = analyzer(both_full_days(), false);
    let day = date(2021, 5, 15);
    analyzer.days().load_as_of(day, noon(2021, 5, 20)).unwrap();

    let (from, to) = day_bounds(day);
    assert_eq!(from, midnight(day));
    assert_eq!(to, midnight(day) + TimeDelta::days(1) - TimeDelta::milliseconds(1));
    let mut devices: Vec<String> = source.calls().into_iter().map(|(id, f, t)| {
        assert_eq!((f, t), (from, to));
        id
    }).collect();
    devices.sort();
    assert_eq!(devices, vec![PRIMARY, SECONDARY]);
}

#[test]
fn current_day_is_returned_but_not_stored() {
    let (analyzer, source) = analyzer(both_full_days(), true);
    let day = date(2021, 5, 15);

    let data = analyzer.days().load_as_of(day, noon(2021, 5, 15)).unwrap();
    assert!(data.is_some());
    assert!(store(&analyzer).keys().unwrap().is_empty());

    analyzer.days().load_as_of(day, noon(2021, 5, 15)).unwrap();
    assert_eq!(source.calls().len(), 4);
}

#[test]
fn future_day_is_absent_without_fetching() {
    let (analyzer, source) = analyzer(both_full_days(), false);
    let result = analyzer.days().load_as_of(date(2021, 5, 16), noon(2021, 5, 15)).unwrap();
    assert!(result.is_none());
    assert!(source.calls().is_empty());
}

#[test]
fn missing_device_export_abandons_the_day() {
    let source = ScriptedSource::new()
        .reply(PRIMARY, Reply::FullDay)
        .reply(SECONDARY, Reply::Empty);
    let (analyzer, _) = analyzer(source, true);

    let result = analyzer.days().load_as_of(date(2021, 5, 15), noon(2021, 5, 20)).unwrap();
    assert!(result.is_none());
    assert!(store(&analyzer).get(&processed_key(date(2021, 5, 15))).unwrap().is_none());
}

#[test]
fn bad_request_abandons_the_day() {
    let source = ScriptedSource::new()
        .reply(PRIMARY, Reply::BadRequest)
        .reply(SECONDARY, Reply::FullDay);
    let (analyzer, _) = analyzer(source, false);

    let result = analyzer.days().load_as_of(date(2021, 5, 15), noon(2021, 5, 20)).unwrap();
    assert!(result.is_none());
    assert!(store(&analyzer).keys().unwrap().is_empty());
}

#[test]
fn unauthorized_is_an_error() {
    let source = ScriptedSource::new()
        .reply(PRIMARY, Reply::FullDay)
        .reply(SECONDARY, Reply::Unauthorized);
    let (analyzer, _) = analyzer(source, false);

    let result = analyzer.days().load_as_of(date(2021, 5, 15), noon(2021, 5, 20));
    assert!(matches!(result, Err(AnalyzerError::Unauthorized)));
}

#[test]
fn missing_devices_are_an_error() {
    let analyzer = Analyzer::builder()
        .store(MemoryStore::new())
        .source(both_full_days())
        .build()
        .unwrap();
    let result = analyzer.days().load_as_of(date(2021, 5, 15), noon(2021, 5, 20));
    assert!(matches!(result, Err(AnalyzerError::InvalidArgument(_))));
}

// ---------------------------------------------------------------------------
// Raw retention
// ---------------------------------------------------------------------------

#[test]
fn raw_exports_are_kept_when_enabled() {
    let (analyzer, _) = analyzer(both_full_days(), true);
    let day = date(2021, 5, 15);
    analyzer.days().load_as_of(day, noon(2021, 5, 20)).unwrap();

    let keys = store(&analyzer).keys().unwrap();
    assert_eq!(
        keys,
        vec![processed_key(day), raw_key(day, PRIMARY), raw_key(day, SECONDARY)]
    );
}

#[test]
fn raw_exports_are_dropped_by_default() {
    let (analyzer, _) = analyzer(both_full_days(), false);
    let day = date(2021, 5, 15);
    analyzer.days().load_as_of(day, noon(2021, 5, 20)).unwrap();
    assert_eq!(store(&analyzer).keys().unwrap(), vec![processed_key(day)]);
}

#[test]
fn stored_raw_exports_are_reused() {
    let (analyzer, source) = analyzer(ScriptedSource::new(), false);
    let day = date(2021, 5, 15);
    let raw = raw_day(day, standard_row);
    store(&analyzer).set(&raw_key(day, PRIMARY), &raw).unwrap();
    store(&analyzer).set(&raw_key(day, SECONDARY), &raw).unwrap();

    let data = analyzer.days().load_as_of(day, noon(2021, 5, 20)).unwrap().unwrap();
    assert_eq!(data.len(), 1440);
    assert!(source.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Offline mode
// ---------------------------------------------------------------------------

#[test]
fn offline_serves_stored_days_only() {
    let analyzer = Analyzer::builder()
        .store(MemoryStore::new())
        .source(both_full_days())
        .devices(PRIMARY, SECONDARY)
        .offline(true)
        .build()
        .unwrap();
    let stored = date(2021, 5, 14);
    let data = common::minutes(midnight(stored), 10, |_, s| s.power_pv = Some(1));
    store(&analyzer)
        .set(&processed_key(stored), &codec::encode(&data).unwrap())
        .unwrap();

    let loaded = analyzer.days().load_as_of(stored, noon(2021, 5, 20)).unwrap();
    assert_eq!(loaded, Some(data));

    let missing = analyzer.days().load_as_of(date(2021, 5, 15), noon(2021, 5, 20));
    assert!(matches!(missing, Err(AnalyzerError::NotFound(_))));
}

#[test]
fn offline_builds_from_retained_raw_exports() {
    let analyzer = Analyzer::builder()
        .store(MemoryStore::new())
        .devices(PRIMARY, SECONDARY)
        .offline(true)
        .build()
        .unwrap();
    let day = date(2021, 5, 15);
    let raw = raw_day(day, standard_row);
    store(&analyzer).set(&raw_key(day, PRIMARY), &raw).unwrap();
    store(&analyzer).set(&raw_key(day, SECONDARY), &raw).unwrap();

    let data = analyzer.days().load_as_of(day, noon(2021, 5, 20)).unwrap().unwrap();
    assert_eq!(data.len(), 1440);
    assert!(store(&analyzer).get(&processed_key(day)).unwrap().is_some());

    // one retained side is not enough without a source
    let other = date(2021, 5, 16);
    store(&analyzer).set(&raw_key(other, PRIMARY), &raw_day(other, standard_row)).unwrap();
    let partial = analyzer.days().load_as_of(other, noon(2021, 5, 20));
    assert!(matches!(partial, Err(AnalyzerError::NotFound(_))));
}

// ---------------------------------------------------------------------------
// Windows, months and statistics
// ---------------------------------------------------------------------------

#[test]
fn window_spans_midnight() {
    let (analyzer, _) = analyzer(both_full_days(), false);
    let from = ts(2021, 5, 14, 23, 0, 0);
    let to = ts(2021, 5, 15, 1, 0, 0);

    let data = analyzer.days().window_as_of(from, to, noon(2021, 5, 20)).unwrap().unwrap();
    assert_eq!(data.len(), 120);
    assert_eq!(data[0].time, from);
    assert_eq!(data[119].time, to - TimeDelta::minutes(1));
}

#[test]
fn window_into_the_future_is_absent() {
    let (analyzer, _) = analyzer(both_full_days(), false);
    let result = analyzer
        .days()
        .window_as_of(ts(2021, 5, 15, 23, 0, 0), ts(2021, 5, 16, 1, 0, 0), noon(2021, 5, 15))
        .unwrap();
    assert!(result.is_none());
}

#[test]
fn empty_window_is_rejected() {
    let (analyzer, _) = analyzer(both_full_days(), false);
    let t = ts(2021, 5, 15, 10, 0, 0);
    assert!(matches!(
        analyzer.days().window_as_of(t, t, noon(2021, 5, 20)),
        Err(AnalyzerError::InvalidArgument(_))
    ));
}

#[test]
fn daily_stats_of_a_loaded_day() {
    let (analyzer, _) = analyzer(both_full_days(), false);
    let stats = analyzer
        .stats()
        .for_day_as_of(date(2021, 5, 15), noon(2021, 5, 20))
        .unwrap()
        .unwrap();
    assert_eq!(stats.power_pv, 14.4);
    assert_eq!(stats.power_household, 7.2);
    assert_eq!(stats.battery1_to, 4.8);
    assert_eq!(stats.battery2_to, 4.8);
    assert_eq!(stats.battery1_soc.map(|r| (r.min, r.max)), Some((50, 50)));
    assert!(!stats.has_failure());
}

#[test]
fn preload_then_month_stats_from_store() {
    let (analyzer, source) = analyzer(both_full_days(), false);
    let now = noon(2021, 5, 4);

    let loaded = analyzer.days().preload_month_as_of(2021, 5, now).unwrap();
    assert_eq!(loaded, 4);
    assert_eq!(source.calls().len(), 8);
    assert_eq!(
        analyzer.storage().stored_days(StoreKind::Processed).unwrap(),
        vec![date(2021, 5, 1), date(2021, 5, 2), date(2021, 5, 3)]
    );

    let stats = analyzer.stats().for_month_as_of(2021, 5, now).unwrap();
    assert_eq!(stats.len(), 3);
    assert_eq!(stats[2].date_time, midnight(date(2021, 5, 3)));
    assert_eq!(source.calls().len(), 8);
}

#[test]
fn month_stats_never_fetch() {
    let (analyzer, source) = analyzer(both_full_days(), false);
    let stats = analyzer.stats().for_month_as_of(2021, 4, noon(2021, 5, 4)).unwrap();
    assert!(stats.is_empty());
    assert!(source.calls().is_empty());
}

#[test]
fn invalid_month_is_rejected() {
    let (analyzer, _) = analyzer(both_full_days(), false);
    assert!(matches!(
        analyzer.days().preload_month_as_of(2021, 13, noon(2021, 5, 4)),
        Err(AnalyzerError::InvalidArgument(_))
    ));
}

// ---------------------------------------------------------------------------
// Store maintenance
// ---------------------------------------------------------------------------

fn seed(analyzer: &Analyzer) {
    for (y, m, d) in [(2021, 4, 30), (2021, 5, 1), (2021, 5, 2), (2022, 5, 1)] {
        let day = date(y, m, d);
        store(analyzer).set(&processed_key(day), "x").unwrap();
        store(analyzer).set(&raw_key(day, PRIMARY), "r").unwrap();
        store(analyzer).set(&raw_key(day, SECONDARY), "r").unwrap();
    }
}

#[test]
fn stored_days_deduplicate_raw_entries() {
    let (analyzer, _) = analyzer(ScriptedSource::new(), false);
    seed(&analyzer);
    let raw_days = analyzer.storage().stored_days(StoreKind::Raw).unwrap();
    assert_eq!(raw_days.len(), 4);
    assert_eq!(analyzer.storage().keys(StoreKind::Raw).unwrap().len(), 8);
}

#[test]
fn delete_one_month_of_one_kind() {
    let (analyzer, _) = analyzer(ScriptedSource::new(), false);
    seed(&analyzer);

    let deleted = analyzer
        .storage()
        .delete_month(StoreKind::Processed, 2021, MonthSelector::Month(5))
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(
        analyzer.storage().stored_days(StoreKind::Processed).unwrap(),
        vec![date(2021, 4, 30), date(2022, 5, 1)]
    );
    assert_eq!(analyzer.storage().keys(StoreKind::Raw).unwrap().len(), 8);
}

#[test]
fn delete_whole_year() {
    let (analyzer, _) = analyzer(ScriptedSource::new(), false);
    seed(&analyzer);

    let deleted = analyzer
        .storage()
        .delete_month(StoreKind::Raw, 2021, MonthSelector::All)
        .unwrap();
    assert_eq!(deleted, 6);
    assert_eq!(
        analyzer.storage().stored_days(StoreKind::Raw).unwrap(),
        vec![date(2022, 5, 1)]
    );
}

#[test]
fn display_summarizes_configuration() {
    let (analyzer, _) = analyzer(ScriptedSource::new(), true);
    let text = analyzer.to_string();
    assert!(text.contains("dev-primary+dev-secondary"));
    assert!(text.contains("online=true"));
    assert!(text.contains("save_raw_data=true"));
}
