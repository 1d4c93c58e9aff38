//! Retrieval of raw per-device exports.
//!
//! [`RawDataSource`] is the seam the day-build fetches through;
//! [`VoltStorageClient`] implements it against the VoltStorage REST API
//! using an already issued API token.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, error, warn};

use crate::config;
use crate::error::{AnalyzerError, Result};
use crate::models::DeviceInfo;

/// Fetches one device's raw export for a time range.
pub trait RawDataSource: Send + Sync {
    /// Raw export text, or `None` when the device has nothing for the range.
    fn fetch_raw(
        &self,
        device_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<String>>;
}

// ---------------------------------------------------------------------------
// VoltStorageClient
// ---------------------------------------------------------------------------

/// Blocking HTTP client for the VoltStorage REST API.
#[derive(Debug, Clone)]
pub struct VoltStorageClient {
    base_url: String,
    token: String,
    client: Client,
}

impl VoltStorageClient {
    /// Create a client authenticating with `token`.
    pub fn new(token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            base_url: config::API_BASE.to_string(),
            token: token.into(),
            client,
        })
    }

    /// Point the client at a different API root (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// List the products registered for the token's account.
    pub fn devices(&self) -> Result<Vec<DeviceInfo>> {
        let url = format!("{}/products", self.base_url);
        debug!("listing devices: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str())])
            .send()?;

        match response.status() {
            StatusCode::BAD_REQUEST => {
                error!("bad request, cannot get products");
                Err(AnalyzerError::UpstreamUnavailable(
                    "bad request, cannot get products".to_string(),
                ))
            }
            StatusCode::UNAUTHORIZED => {
                error!("not authorized to list products");
                Err(AnalyzerError::Unauthorized)
            }
            _ => Ok(response.error_for_status()?.json()?),
        }
    }
}

impl RawDataSource for VoltStorageClient {
    fn fetch_raw(
        &self,
        device_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<String>> {
        let url = format!("{}/data/export.csv", self.base_url);
        debug!("fetching export for {} from {} to {}", device_id, from, to);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("token", self.token.clone()),
                ("productId", device_id.to_string()),
                ("from", from.timestamp().to_string()),
                ("to", to.timestamp().to_string()),
                ("tolerance", config::EXPORT_TOLERANCE.to_string()),
                ("precision", config::EXPORT_PRECISION.to_string()),
                ("separator", config::EXPORT_SEPARATOR.to_string()),
            ])
            .send()?;

        match response.status() {
            StatusCode::BAD_REQUEST => {
                error!("bad request for {}, perhaps time frame in the future", device_id);
                return Err(AnalyzerError::UpstreamUnavailable(format!(
                    "bad request for {device_id}, perhaps time frame in the future"
                )));
            }
            StatusCode::UNAUTHORIZED => {
                error!("not authorized to fetch export for {}", device_id);
                return Err(AnalyzerError::Unauthorized);
            }
            _ => {}
        }

        let body = response.error_for_status()?.text()?;
        if body.trim().is_empty() {
            warn!("empty export for {}", device_id);
            return Ok(None);
        }

        debug!("export for {} loaded, size: {}", device_id, body.len());
        Ok(Some(body))
    }
}
