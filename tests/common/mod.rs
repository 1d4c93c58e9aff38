//! Shared test fixtures for the analyzer integration tests.
//!
//! Provides builders for raw device exports in the API's CSV layout,
//! generators for unified datasets, and [`ScriptedSource`], a
//! [`RawDataSource`] that serves canned exports and records every fetch.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use voltstorage_analyzer::{AnalyzerError, RawDataSource, Result, Sample};

pub const PRIMARY: &str = "dev-primary";
pub const SECONDARY: &str = "dev-secondary";

pub const RAW_HEADER: &str = "Time;Power_Grid;Power_Household;inverterPower;Power_PV;\
                              Power_Power Electronics;SOC_State of Charge;Status";

/// One data row of a raw export.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub time: DateTime<Utc>,
    pub grid: i64,
    pub household: i64,
    pub pv: i64,
    pub battery: i64,
    pub soc: f64,
}

impl RawRow {
    pub fn at(time: DateTime<Utc>) -> Self {
        Self {
            time,
            grid: 0,
            household: 0,
            pv: 0,
            battery: 0,
            soc: 0.5,
        }
    }
}

/// Render rows as a raw export with the `sep=;` preamble.
pub fn raw_export(rows: &[RawRow]) -> String {
    let mut out = format!("sep=;\r\n{RAW_HEADER}\r\n");
    for row in rows {
        out.push_str(&format!(
            "{};{};{};0;{};{};{};ok\r\n",
            row.time.to_rfc3339(),
            row.grid,
            row.household,
            row.pv,
            row.battery,
            row.soc
        ));
    }
    out
}

/// A full day of one-minute rows for `date`, built by `f(minute)`.
pub fn raw_day(date: NaiveDate, f: impl Fn(i64, &mut RawRow)) -> String {
    let start = midnight(date);
    let rows: Vec<RawRow> = (0..1440)
        .map(|minute| {
            let mut row = RawRow::at(start + TimeDelta::minutes(minute));
            f(minute, &mut row);
            row
        })
        .collect();
    raw_export(&rows)
}

/// 600 W of PV, 300 W household, battery charging at 200 W, 50% SoC.
pub fn standard_row(_minute: i64, row: &mut RawRow) {
    row.pv = 600;
    row.household = 300;
    row.battery = -200;
    row.soc = 0.5;
}

pub fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ts(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
}

/// `count` samples one minute apart starting at `start`, filled by `f`.
pub fn minutes(start: DateTime<Utc>, count: i64, f: impl Fn(i64, &mut Sample)) -> Vec<Sample> {
    (0..count)
        .map(|i| {
            let mut s = Sample::new(start + TimeDelta::minutes(i));
            f(i, &mut s);
            s
        })
        .collect()
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Reply {
    Export(String),
    /// A full day of rows for the requested date, built with [`standard_row`].
    FullDay,
    Empty,
    BadRequest,
    Unauthorized,
}

/// Serves scripted replies per device id and counts fetches.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<(String, DateTime<Utc>, DateTime<Utc>)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, device_id: &str, reply: Reply) -> Self {
        self.replies.insert(device_id.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<(String, DateTime<Utc>, DateTime<Utc>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RawDataSource for ScriptedSource {
    fn fetch_raw(
        &self,
        device_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((device_id.to_string(), from, to));
        match self.replies.get(device_id) {
            Some(Reply::Export(text)) => Ok(Some(text.clone())),
            Some(Reply::FullDay) => Ok(Some(raw_day(from.date_naive(), standard_row))),
            Some(Reply::Empty) | None => Ok(None),
            Some(Reply::BadRequest) => Err(AnalyzerError::UpstreamUnavailable(format!(
                "bad request for {device_id}"
            ))),
            Some(Reply::Unauthorized) => Err(AnalyzerError::Unauthorized),
        }
    }
}

/// Forwards to a shared [`ScriptedSource`] so tests can inspect calls after
/// handing the source to an analyzer.
#[derive(Debug, Clone)]
pub struct SharedSource(pub std::sync::Arc<ScriptedSource>);

impl RawDataSource for SharedSource {
    fn fetch_raw(
        &self,
        device_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.0.fetch_raw(device_id, from, to)
    }
}
