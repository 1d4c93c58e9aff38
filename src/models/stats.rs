use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SocRange — Min/max state of charge of one battery over a day
// ---------------------------------------------------------------------------

/// Minimum and maximum state of charge in whole percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocRange {
    pub min: i64,
    pub max: i64,
}

// ---------------------------------------------------------------------------
// DailyStats — Derived summary of one calendar day
// ---------------------------------------------------------------------------

/// Summary of one day of unified telemetry.
///
/// Energy values are kWh rounded to one decimal; they are `0.0` when the
/// dataset does not hold exactly one sample per minute of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    /// Timestamp of the first sample of the day.
    pub date_time: DateTime<Utc>,
    /// `None` when the battery reported no SoC that day.
    pub battery1_soc: Option<SocRange>,
    pub battery2_soc: Option<SocRange>,
    #[serde(rename = "powerPV")]
    pub power_pv: f64,
    pub power_household: f64,
    pub power_from_grid: f64,
    pub power_to_grid: f64,
    pub battery1_to: f64,
    pub battery1_from: f64,
    pub battery2_to: f64,
    pub battery2_from: f64,
    /// Heuristic failure description, empty when the day looks healthy.
    pub failures: String,
}

impl DailyStats {
    pub fn has_failure(&self) -> bool {
        !self.failures.is_empty()
    }
}
