//! Daily and monthly statistics on top of [`DayQuery`].

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::backend::Backend;
use crate::config;
use crate::error::{AnalyzerError, Result};
use crate::models::DailyStats;
use crate::queries::days::DayQuery;
use crate::stats;

pub struct StatsQuery<'a> {
    backend: &'a Backend,
}

impl<'a> StatsQuery<'a> {
    pub fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    fn days(&self) -> DayQuery<'a> {
        DayQuery::new(self.backend)
    }

    /// Statistics of `date`, loading (and possibly fetching) the day first.
    pub fn for_day(&self, date: NaiveDate) -> Result<Option<DailyStats>> {
        self.for_day_as_of(date, Utc::now())
    }

    pub fn for_day_as_of(&self, date: NaiveDate, now: DateTime<Utc>) -> Result<Option<DailyStats>> {
        match self.days().load_as_of(date, now)? {
            Some(data) => Ok(Some(stats::daily_stats(&data)?)),
            None => Ok(None),
        }
    }

    /// Statistics for each stored day of `month` before today.
    ///
    /// Never fetches; days that are not stored are left out.
    pub fn for_month(&self, year: i32, month: u32) -> Result<Vec<DailyStats>> {
        self.for_month_as_of(year, month, Utc::now())
    }

    pub fn for_month_as_of(
        &self,
        year: i32,
        month: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<DailyStats>> {
        let days = config::month_days(year, month).ok_or_else(|| {
            AnalyzerError::InvalidArgument(format!("invalid month {year}-{month}"))
        })?;

        let mut result = Vec::new();
        for date in days.into_iter().take_while(|d| *d < now.date_naive()) {
            match self.days().cached(date)? {
                Some(data) => result.push(stats::daily_stats(&data)?),
                None => debug!("{} not stored, skipping", date),
            }
        }
        Ok(result)
    }
}
