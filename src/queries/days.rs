//! Loading unified day datasets: from the store when possible, otherwise by
//! fetching both raw exports and running the transform.

use std::thread;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::codec;
use crate::config;
use crate::error::{AnalyzerError, Result};
use crate::merger;
use crate::models::{Dataset, DeviceRole};
use crate::source::RawDataSource;

/// First and last instant of `date` in UTC (`00:00:00.000` .. `23:59:59.999`).
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = date.and_time(NaiveTime::MIN).and_utc();
    let to = from + TimeDelta::days(1) - TimeDelta::milliseconds(1);
    (from, to)
}

// ---------------------------------------------------------------------------
// DayQuery
// ---------------------------------------------------------------------------

/// Day-level dataset access bound to a [`Backend`].
pub struct DayQuery<'a> {
    backend: &'a Backend,
}

impl<'a> DayQuery<'a> {
    pub fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Load the unified dataset of `date`, relative to the current time.
    pub fn load(&self, date: NaiveDate) -> Result<Option<Dataset>> {
        self.load_as_of(date, Utc::now())
    }

    /// Load the unified dataset of `date` as if the current time were `now`.
    ///
    /// Returns `Ok(None)` when the day lies in the future, when either device
    /// has no export for it, or when the API answers with a bad request. A
    /// day is only written to the store once it is complete, i.e. its whole
    /// calendar day lies before `now`.
    ///
    /// Without a raw data source (offline mode) the day can still be built
    /// from raw exports retained in the store.
    ///
    /// # Errors
    ///
    /// [`AnalyzerError::NotFound`] if the day is neither stored nor buildable
    /// from retained raw exports in offline mode,
    /// [`AnalyzerError::Unauthorized`] if the API rejects the token, plus store
    /// and transport failures.
    pub fn load_as_of(&self, date: NaiveDate, now: DateTime<Utc>) -> Result<Option<Dataset>> {
        if let Some(data) = self.cached(date)? {
            debug!("{} loaded from store ({} entries)", date, data.len());
            return Ok(Some(data));
        }

        let (from, to) = day_bounds(date);
        if from > now {
            warn!("cannot load future data for {}", date);
            return Ok(None);
        }

        let source = self.backend.source();
        let devices = match source {
            Some(_) => self.backend.require_devices()?,
            None => self.backend.devices().ok_or_else(|| offline_miss(date))?,
        };
        let complete = date < now.date_naive();

        info!("loading raw data for {}", date);
        let (primary, secondary) = thread::scope(|scope| {
            let secondary = scope.spawn(|| {
                self.raw_export(source, &devices.secondary, date, from, to, complete)
            });
            let primary = self.raw_export(source, &devices.primary, date, from, to, complete);
            let secondary = secondary.join().unwrap_or_else(|_| {
                Err(AnalyzerError::UpstreamUnavailable(format!(
                    "fetch of {} panicked",
                    devices.id(DeviceRole::Secondary)
                )))
            });
            (primary, secondary)
        });

        let (Some(primary), Some(secondary)) = (available(primary)?, available(secondary)?) else {
            warn!("no complete raw data for {}, skipping day", date);
            return Ok(None);
        };

        let data = merger::transform(&primary, &secondary)?;
        if data.is_empty() {
            warn!("raw exports for {} contain no samples", date);
            return Ok(None);
        }

        if complete {
            let key = config::processed_key(date);
            self.backend.store().set(&key, &codec::encode(&data)?)?;
            info!("{} stored as {}", date, key);
        } else {
            debug!("{} is not complete yet, not storing", date);
        }
        Ok(Some(data))
    }

    /// The stored dataset of `date`, never fetching.
    ///
    /// An entry that decodes to nothing is treated as missing.
    pub fn cached(&self, date: NaiveDate) -> Result<Option<Dataset>> {
        let key = config::processed_key(date);
        let Some(text) = self.backend.store().get(&key)? else {
            return Ok(None);
        };
        let data = codec::decode(&text);
        if data.is_empty() {
            warn!("stored entry {} holds no samples, ignoring it", key);
            return Ok(None);
        }
        Ok(Some(data))
    }

    /// Samples in `[from, to)`, assembled from every day the range touches.
    ///
    /// Returns `Ok(None)` if any of those days cannot be loaded.
    pub fn window(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Option<Dataset>> {
        self.window_as_of(from, to, Utc::now())
    }

    pub fn window_as_of(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Option<Dataset>> {
        if to <= from {
            return Err(AnalyzerError::InvalidArgument(format!(
                "empty window: {from} .. {to}"
            )));
        }
        let last = (to - TimeDelta::milliseconds(1)).date_naive();

        let mut data = Vec::new();
        for date in from.date_naive().iter_days().take_while(|d| *d <= last) {
            match self.load_as_of(date, now)? {
                Some(day) => data.extend(day),
                None => return Ok(None),
            }
        }
        data.retain(|s| s.time >= from && s.time < to);
        Ok(Some(data))
    }

    /// Load every day of `month` up to `now`, storing the complete ones.
    ///
    /// Returns the number of days that produced a dataset.
    pub fn preload_month(&self, year: i32, month: u32) -> Result<usize> {
        self.preload_month_as_of(year, month, Utc::now())
    }

    pub fn preload_month_as_of(&self, year: i32, month: u32, now: DateTime<Utc>) -> Result<usize> {
        let days = config::month_days(year, month).ok_or_else(|| {
            AnalyzerError::InvalidArgument(format!("invalid month {year}-{month}"))
        })?;

        let mut loaded = 0;
        for date in days.into_iter().take_while(|d| *d <= now.date_naive()) {
            if self.load_as_of(date, now)?.is_some() {
                loaded += 1;
            }
        }
        info!("preloaded {} days of {}-{:02}", loaded, year, month);
        Ok(loaded)
    }

    /// One device's raw export: from the store if retained, otherwise fetched.
    fn raw_export(
        &self,
        source: Option<&dyn RawDataSource>,
        device_id: &str,
        date: NaiveDate,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        complete: bool,
    ) -> Result<Option<String>> {
        let key = config::raw_key(date, device_id);
        if let Some(raw) = self.backend.store().get(&key)? {
            debug!("raw export {} loaded from store", key);
            return Ok(Some(raw));
        }

        let source = source.ok_or_else(|| offline_miss(date))?;
        let raw = source.fetch_raw(device_id, from, to)?;
        if let Some(raw) = &raw {
            if self.backend.options.save_raw_data && complete {
                self.backend.store().set(&key, raw)?;
                debug!("raw export {} retained", key);
            }
        }
        Ok(raw)
    }
}

fn offline_miss(date: NaiveDate) -> AnalyzerError {
    AnalyzerError::NotFound(format!(
        "data for {date} is not stored and offline mode is enabled"
    ))
}

/// Bad requests end the day-build quietly instead of failing it.
fn available(result: Result<Option<String>>) -> Result<Option<String>> {
    match result {
        Err(AnalyzerError::UpstreamUnavailable(msg)) => {
            warn!("{}", msg);
            Ok(None)
        }
        other => other,
    }
}
