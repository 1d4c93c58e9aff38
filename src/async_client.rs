//! Async wrapper around [`Analyzer`] for use in async runtimes (Tokio, etc.).
//!
//! Every operation runs on the blocking thread pool via
//! [`tokio::task::spawn_blocking`]; fetching and storing are blocking I/O.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use voltstorage_analyzer::AsyncAnalyzer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let analyzer = AsyncAnalyzer::builder()
//!         .token("my-api-token")
//!         .devices("primary-id", "secondary-id")
//!         .build()
//!         .await
//!         .unwrap();
//!
//!     let date = NaiveDate::from_ymd_opt(2021, 5, 15).unwrap();
//!     let stats = analyzer.daily_stats(date).await.unwrap();
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::{AnalyzerError, Result};
use crate::models::{DailyStats, Dataset};
use crate::Analyzer;

// ---------------------------------------------------------------------------
// AsyncAnalyzerBuilder
// ---------------------------------------------------------------------------

/// Builder for an [`AsyncAnalyzer`] using the default store and HTTP client.
///
/// To inject a custom store or source, build an [`Analyzer`] and convert it
/// with [`AsyncAnalyzer::from`].
pub struct AsyncAnalyzerBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    token: Option<String>,
    devices: Option<(String, String)>,
    save_raw_data: bool,
}

impl Default for AsyncAnalyzerBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(120),
            token: None,
            devices: None,
            save_raw_data: false,
        }
    }
}

impl AsyncAnalyzerBuilder {
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn devices(mut self, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        self.devices = Some((primary.into(), secondary.into()));
        self
    }

    pub fn save_raw_data(mut self, save: bool) -> Self {
        self.save_raw_data = save;
        self
    }

    /// Build the analyzer on the blocking thread pool.
    pub async fn build(self) -> Result<AsyncAnalyzer> {
        tokio::task::spawn_blocking(move || {
            let mut builder = Analyzer::builder()
                .offline(self.offline)
                .timeout(self.timeout)
                .save_raw_data(self.save_raw_data);
            if let Some(dir) = self.cache_dir {
                builder = builder.cache_dir(dir);
            }
            if let Some(token) = self.token {
                builder = builder.token(token);
            }
            if let Some((primary, secondary)) = self.devices {
                builder = builder.devices(primary, secondary);
            }
            Ok(AsyncAnalyzer::from(builder.build()?))
        })
        .await
        .map_err(|e| AnalyzerError::InvalidArgument(format!("Task join error: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// AsyncAnalyzer
// ---------------------------------------------------------------------------

/// Async wrapper around [`Analyzer`].
///
/// The analyzer sits behind a [`Mutex`], so operations on one instance run
/// one at a time.
pub struct AsyncAnalyzer {
    inner: Arc<Mutex<Analyzer>>,
}

impl From<Analyzer> for AsyncAnalyzer {
    fn from(analyzer: Analyzer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(analyzer)),
        }
    }
}

impl AsyncAnalyzer {
    pub fn builder() -> AsyncAnalyzerBuilder {
        AsyncAnalyzerBuilder::default()
    }

    /// Run a sync operation on the blocking thread pool.
    ///
    /// ```no_run
    /// # use voltstorage_analyzer::{AsyncAnalyzer, StoreKind};
    /// # async fn example() -> voltstorage_analyzer::Result<()> {
    /// # let analyzer = AsyncAnalyzer::builder().build().await?;
    /// let days = analyzer.run(|a| a.storage().stored_days(StoreKind::Processed)).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Analyzer) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let analyzer = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = analyzer
                .lock()
                .map_err(|_| AnalyzerError::InvalidArgument("analyzer lock poisoned".into()))?;
            f(&guard)
        })
        .await
        .map_err(|e| AnalyzerError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Load the unified dataset of `date`.
    pub async fn load_day(&self, date: NaiveDate) -> Result<Option<Dataset>> {
        self.run(move |a| a.days().load(date)).await
    }

    /// Statistics of `date`.
    pub async fn daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>> {
        self.run(move |a| a.stats().for_day(date)).await
    }

    /// Statistics of every stored day of a month.
    pub async fn month_stats(&self, year: i32, month: u32) -> Result<Vec<DailyStats>> {
        self.run(move |a| a.stats().for_month(year, month)).await
    }
}
