//! Daily statistics and the export-instead-of-charge failure heuristic.

use tracing::{debug, warn};

use crate::config::MINUTES_PER_DAY;
use crate::error::{AnalyzerError, Result};
use crate::models::{DailyStats, Field, Sample, SocRange};

const FAIL_EXPORT_WATTS: f64 = 1000.0;
const FAIL_CHARGE_WATTS: f64 = 100.0;
const FAIL_SOC: f64 = 0.90;
const FAIL_MINUTES: usize = 15;

/// Compute the summary of one full day at native resolution.
///
/// # Errors
///
/// [`AnalyzerError::InvalidArgument`] if `data` is empty.
pub fn daily_stats(data: &[Sample]) -> Result<DailyStats> {
    let first = data.first().ok_or_else(|| {
        AnalyzerError::InvalidArgument("cannot compute stats of an empty dataset".to_string())
    })?;
    debug!(entries = data.len(), "computing daily stats");

    Ok(DailyStats {
        date_time: first.time,
        battery1_soc: soc_range(data, Field::Battery1Soc),
        battery2_soc: soc_range(data, Field::Battery2Soc),
        power_pv: energy_kwh(data, Field::PowerPv),
        power_household: energy_kwh(data, Field::PowerHousehold),
        power_from_grid: energy_kwh(data, Field::PowerFromGrid),
        power_to_grid: energy_kwh(data, Field::PowerToGrid),
        battery1_to: energy_kwh(data, Field::Battery1To),
        battery1_from: energy_kwh(data, Field::Battery1From),
        battery2_to: energy_kwh(data, Field::Battery2To),
        battery2_from: energy_kwh(data, Field::Battery2From),
        failures: failure_description(data),
    })
}

/// Min/max of a SoC field in whole percent, over the samples that carry it.
pub fn soc_range(data: &[Sample], field: Field) -> Option<SocRange> {
    let mut values = data.iter().filter_map(|s| s.get(field));
    let first = values.next()?;
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
    Some(SocRange {
        min: (min * 100.0).round() as i64,
        max: (max * 100.0).round() as i64,
    })
}

/// Energy of a power field over one day in kWh, one decimal.
///
/// Absent minutes count as 0 W. Returns `0.0` unless `data` holds exactly
/// one sample per minute of the day.
pub fn energy_kwh(data: &[Sample], field: Field) -> f64 {
    if data.len() != MINUTES_PER_DAY {
        warn!(
            "wrong number of entries for {}: {} (need {} for a whole day)",
            field.name(),
            data.len(),
            MINUTES_PER_DAY
        );
        return 0.0;
    }
    let watt_minutes: f64 = data.iter().map(|s| s.get(field).unwrap_or(0.0)).sum();
    // W·min / 60 -> Wh, / 1000 -> kWh, kept at one decimal
    (watt_minutes / 60.0 / 100.0).round() / 10.0
}

/// Whether a sample exports to the grid while a battery with room left is
/// barely charging. Absent values count as 0.
pub fn is_failure_minute(sample: &Sample) -> bool {
    let value = |field: Field| sample.get(field).unwrap_or(0.0);
    let battery_idle = |soc: Field, to: Field| value(soc) < FAIL_SOC && value(to) < FAIL_CHARGE_WATTS;

    value(Field::PowerToGrid) > FAIL_EXPORT_WATTS
        && (battery_idle(Field::Battery1Soc, Field::Battery1To)
            || battery_idle(Field::Battery2Soc, Field::Battery2To))
}

/// Number of minutes matching [`is_failure_minute`].
pub fn failure_minutes(data: &[Sample]) -> usize {
    data.iter().filter(|s| is_failure_minute(s)).count()
}

/// Failure text for the day, empty unless more than 15 minutes match.
pub fn failure_description(data: &[Sample]) -> String {
    let minutes = failure_minutes(data);
    if minutes > FAIL_MINUTES {
        debug!(minutes, "failure heuristic triggered");
        format!("power to grid but too little power to battery for {minutes} minutes")
    } else {
        String::new()
    }
}
