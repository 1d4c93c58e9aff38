//! Shared state behind every query wrapper: the store, the raw data source
//! and the device pair.

use std::fmt;

use crate::error::{AnalyzerError, Result};
use crate::models::DevicePair;
use crate::source::RawDataSource;
use crate::store::Store;

/// Options threaded into each day-build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayBuildOptions {
    /// Keep fetched raw exports of completed days in the store.
    pub save_raw_data: bool,
}

pub struct Backend {
    store: Box<dyn Store>,
    source: Option<Box<dyn RawDataSource>>,
    devices: Option<DevicePair>,
    /// Options applied to day-builds started through this backend.
    pub options: DayBuildOptions,
}

impl Backend {
    /// Assemble a backend. Without a `source` only stored data is reachable.
    pub fn new(
        store: Box<dyn Store>,
        source: Option<Box<dyn RawDataSource>>,
        devices: Option<DevicePair>,
        options: DayBuildOptions,
    ) -> Self {
        Self {
            store,
            source,
            devices,
            options,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn source(&self) -> Option<&dyn RawDataSource> {
        self.source.as_deref()
    }

    pub fn devices(&self) -> Option<&DevicePair> {
        self.devices.as_ref()
    }

    /// Whether raw exports can be fetched at all.
    pub fn is_online(&self) -> bool {
        self.source.is_some()
    }

    /// The device pair, required by anything that fetches.
    pub fn require_devices(&self) -> Result<&DevicePair> {
        self.devices.as_ref().ok_or_else(|| {
            AnalyzerError::InvalidArgument("no primary/secondary devices configured".to_string())
        })
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend")
            .field("online", &self.is_online())
            .field("devices", &self.devices)
            .field("options", &self.options)
            .finish()
    }
}
