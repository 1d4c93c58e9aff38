//! Telemetry analyzer for a pair of VoltStorage home batteries.
//!
//! Raw per-device exports are fetched from the VoltStorage REST API, decoded,
//! merged into one dataset per day at one-minute resolution, stored locally
//! and summarized into daily statistics.
//!
//! # Quick start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use voltstorage_analyzer::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .token("my-api-token")
//!     .devices("primary-id", "secondary-id")
//!     .build()
//!     .unwrap();
//!
//! let date = NaiveDate::from_ymd_opt(2021, 5, 15).unwrap();
//! if let Some(stats) = analyzer.stats().for_day(date).unwrap() {
//!     println!("PV: {} kWh", stats.power_pv);
//! }
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod backend;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod error;
pub mod merger;
pub mod models;
pub mod queries;
pub mod resample;
pub mod source;
pub mod stats;
pub mod store;

#[cfg(feature = "async")]
pub use async_client::AsyncAnalyzer;
pub use backend::{Backend, DayBuildOptions};
pub use config::{MonthSelector, StoreKind};
pub use error::{AnalyzerError, Result};
pub use merger::{interleave, merge, transform};
pub use models::{DailyStats, Dataset, DeviceInfo, DevicePair, DeviceRole, Field, Sample, SocRange};
pub use resample::resample;
pub use source::{RawDataSource, VoltStorageClient};
pub use store::{FileStore, MemoryStore, Store};

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// AnalyzerBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an [`Analyzer`].
///
/// Use [`Analyzer::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](AnalyzerBuilder::build).
pub struct AnalyzerBuilder {
    cache_dir: Option<PathBuf>,
    offline: bool,
    timeout: Duration,
    token: Option<String>,
    api_base: Option<String>,
    devices: Option<DevicePair>,
    save_raw_data: bool,
    source: Option<Box<dyn RawDataSource>>,
    store: Option<Box<dyn Store>>,
}

impl Default for AnalyzerBuilder {
    fn default() -> Self {
        Self {
            cache_dir: None,
            offline: false,
            timeout: Duration::from_secs(120),
            token: None,
            api_base: None,
            devices: None,
            save_raw_data: false,
            source: None,
            store: None,
        }
    }
}

impl AnalyzerBuilder {
    /// Set a custom cache directory for the default [`FileStore`].
    ///
    /// If not set, the platform cache directory is used
    /// (e.g. `~/.cache/voltstorage-analyzer` on Linux).
    pub fn cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable offline mode.
    ///
    /// When offline, nothing is fetched and only stored days are available.
    /// Defaults to `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Set the HTTP request timeout. Defaults to 120 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// API token used by the default [`VoltStorageClient`].
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Override the API root of the default client.
    pub fn api_base(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = Some(base_url.into());
        self
    }

    /// Product ids of the primary and the secondary device.
    pub fn devices(mut self, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        self.devices = Some(DevicePair::new(primary, secondary));
        self
    }

    /// Keep raw exports of completed days in the store. Defaults to `false`.
    pub fn save_raw_data(mut self, save: bool) -> Self {
        self.save_raw_data = save;
        self
    }

    /// Use a custom raw data source instead of the HTTP client.
    pub fn source(mut self, source: impl RawDataSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Use a custom store instead of a [`FileStore`] in the cache directory.
    pub fn store(mut self, store: impl Store + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Build the analyzer.
    ///
    /// Creates the cache directory if needed. No request is made here; raw
    /// exports are fetched lazily when a day is first loaded.
    pub fn build(self) -> Result<Analyzer> {
        let store: Box<dyn Store> = match self.store {
            Some(store) => store,
            None => Box::new(FileStore::new(self.cache_dir)?),
        };

        let source: Option<Box<dyn RawDataSource>> = match (self.offline, self.source, self.token) {
            (true, _, _) => None,
            (false, Some(source), _) => Some(source),
            (false, None, Some(token)) => {
                let mut client = VoltStorageClient::new(token, self.timeout)?;
                if let Some(base) = self.api_base {
                    client = client.with_base_url(base);
                }
                Some(Box::new(client))
            }
            (false, None, None) => {
                tracing::warn!("no API token configured, only stored data is available");
                None
            }
        };

        let options = DayBuildOptions {
            save_raw_data: self.save_raw_data,
        };
        Ok(Analyzer {
            backend: Backend::new(store, source, self.devices, options),
        })
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// The main entry point.
///
/// Wraps a [`Backend`] (store, raw data source and device pair) and exposes
/// the query interfaces as lightweight borrowing wrappers.
pub struct Analyzer {
    backend: Backend,
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    /// Day dataset loading, windows and month preloading.
    pub fn days(&self) -> queries::DayQuery<'_> {
        queries::DayQuery::new(&self.backend)
    }

    /// Daily and monthly statistics.
    pub fn stats(&self) -> queries::StatsQuery<'_> {
        queries::StatsQuery::new(&self.backend)
    }

    /// Store listing and bulk deletion.
    pub fn storage(&self) -> queries::StorageQuery<'_> {
        queries::StorageQuery::new(&self.backend)
    }

    /// Return a reference to the underlying [`Backend`].
    pub fn backend(&self) -> &Backend {
        &self.backend
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let devices = match self.backend.devices() {
            Some(d) => format!("{}+{}", d.primary, d.secondary),
            None => "none".to_string(),
        };
        write!(
            f,
            "Analyzer(devices={}, online={}, save_raw_data={})",
            devices,
            self.backend.is_online(),
            self.backend.options.save_raw_data
        )
    }
}
