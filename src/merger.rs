//! Combines the primary and secondary device streams into one dataset.

use tracing::debug;

use crate::config::NATIVE_RESOLUTION_SECONDS;
use crate::decoder;
use crate::error::Result;
use crate::models::{Dataset, DeviceRole};
use crate::resample::resample;

/// Concatenate both streams and stable-sort by time.
///
/// Samples are not combined: each keeps only the fields its device
/// populated. At equal timestamps primary samples stay ahead of secondary ones.
pub fn interleave(primary: Dataset, secondary: Dataset) -> Dataset {
    let mut data = primary;
    data.extend(secondary);
    data.sort_by_key(|s| s.time);
    data
}

/// Interleave both streams and fold them into one sample per native minute.
///
/// Returns an empty dataset when neither stream holds any sample.
pub fn merge(primary: Dataset, secondary: Dataset) -> Result<Dataset> {
    let data = interleave(primary, secondary);
    debug!(entries = data.len(), "streams interleaved");
    if data.is_empty() {
        return Ok(data);
    }
    resample(&data, NATIVE_RESOLUTION_SECONDS)
}

/// Decode both raw exports and merge them into the unified dataset.
pub fn transform(raw_primary: &str, raw_secondary: &str) -> Result<Dataset> {
    let primary = decoder::decode(raw_primary, DeviceRole::Primary);
    let secondary = decoder::decode(raw_secondary, DeviceRole::Secondary);
    merge(primary, secondary)
}
