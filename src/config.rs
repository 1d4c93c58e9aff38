use chrono::{Datelike, NaiveDate};
use std::path::PathBuf;

pub const API_BASE: &str = "https://api.voltstorage.com/rest";

// Export query parameters. `tolerance=0` asks for one row per reported minute,
// `precision=3` matches the SoC rounding applied by the resampler.
pub const EXPORT_TOLERANCE: u32 = 0;
pub const EXPORT_PRECISION: u32 = 3;
pub const EXPORT_SEPARATOR: char = ';';

/// Native device resolution in seconds.
pub const NATIVE_RESOLUTION_SECONDS: i64 = 60;

/// Number of native samples in one complete day.
pub const MINUTES_PER_DAY: usize = 1440;

pub const PROCESSED_SUFFIX: &str = "-vs-processed";
pub const RAW_SUFFIX: &str = "-vs-raw-";

const KEY_DATE_FORMAT: &str = "%Y.%m.%d";

/// Which family of store entries an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Unified, encoded datasets (`YYYY.MM.DD-vs-processed`).
    Processed,
    /// Unprocessed per-device payloads (`YYYY.MM.DD-vs-raw-<deviceId>`).
    Raw,
}

impl StoreKind {
    /// Whether `key` belongs to this family.
    pub fn matches(self, key: &str) -> bool {
        match self {
            StoreKind::Processed => key.ends_with(PROCESSED_SUFFIX),
            StoreKind::Raw => key.contains(RAW_SUFFIX),
        }
    }
}

/// Month part of a bulk store selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthSelector {
    All,
    Month(u32),
}

/// Store key of the unified dataset for `date`.
pub fn processed_key(date: NaiveDate) -> String {
    format!("{}{}", date.format(KEY_DATE_FORMAT), PROCESSED_SUFFIX)
}

/// Store key of one device's raw export for `date`.
pub fn raw_key(date: NaiveDate, device_id: &str) -> String {
    format!("{}{}{}", date.format(KEY_DATE_FORMAT), RAW_SUFFIX, device_id)
}

/// Parse the calendar day a store key refers to.
pub fn key_date(key: &str) -> Option<NaiveDate> {
    let date_part = key.get(..10)?;
    NaiveDate::parse_from_str(date_part, KEY_DATE_FORMAT).ok()
}

/// Key prefix for a year/month selection, e.g. `"2021"` or `"2021.05"`.
pub fn month_prefix(year: i32, month: MonthSelector) -> String {
    match month {
        MonthSelector::All => format!("{year:04}"),
        MonthSelector::Month(m) => format!("{year:04}.{m:02}"),
    }
}

/// Every calendar day of `month` in `year`, or `None` for an invalid month.
pub fn month_days(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(
        first
            .iter_days()
            .take_while(|d| d.month() == month)
            .collect(),
    )
}

pub fn default_cache_dir() -> PathBuf {
    if let Some(cache) = dirs::cache_dir() {
        cache.join("voltstorage-analyzer")
    } else {
        PathBuf::from(".voltstorage-analyzer-cache")
    }
}
