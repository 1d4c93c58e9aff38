//! Listing and bulk deletion of store entries.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::backend::Backend;
use crate::config::{self, MonthSelector, StoreKind};
use crate::error::{AnalyzerError, Result};

pub struct StorageQuery<'a> {
    backend: &'a Backend,
}

impl<'a> StorageQuery<'a> {
    pub fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Keys of the given kind, sorted.
    pub fn keys(&self, kind: StoreKind) -> Result<Vec<String>> {
        Ok(self
            .backend
            .store()
            .keys()?
            .into_iter()
            .filter(|k| kind.matches(k))
            .collect())
    }

    /// Distinct days with at least one entry of the given kind, ascending.
    pub fn stored_days(&self, kind: StoreKind) -> Result<Vec<NaiveDate>> {
        let mut days: Vec<NaiveDate> = self
            .keys(kind)?
            .iter()
            .filter_map(|k| config::key_date(k))
            .collect();
        days.dedup();
        Ok(days)
    }

    /// Delete every entry of `kind` in a whole year or one month of it.
    ///
    /// Returns the number of deleted entries.
    pub fn delete_month(&self, kind: StoreKind, year: i32, month: MonthSelector) -> Result<usize> {
        if let MonthSelector::Month(m) = month {
            if !(1..=12).contains(&m) {
                return Err(AnalyzerError::InvalidArgument(format!("invalid month {m}")));
            }
        }
        let prefix = config::month_prefix(year, month);

        let mut deleted = 0;
        for key in self.keys(kind)?.iter().filter(|k| k.starts_with(&prefix)) {
            self.backend.store().delete(key)?;
            debug!("deleted {}", key);
            deleted += 1;
        }
        info!("deleted {} entries for {}", deleted, prefix);
        Ok(deleted)
    }
}
