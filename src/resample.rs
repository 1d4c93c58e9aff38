//! Fixed-width temporal resampling by per-field averaging.
//!
//! Buckets are anchored at the first sample's timestamp, not at a wall-clock
//! grid. Every field is averaged over the samples in the bucket that carry
//! that field, so fields with different gaps never dilute each other. A
//! bucket without any reading for a field yields `None`, never `0`.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::error::{AnalyzerError, Result};
use crate::models::{Dataset, Field, Sample};

/// SoC averages keep three decimals.
const SOC_SCALE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, Default)]
struct FieldAccumulator {
    sum: f64,
    samples: u32,
}

impl FieldAccumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.samples += 1;
    }

    fn average(&self, field: Field) -> Option<f64> {
        if self.samples == 0 {
            return None;
        }
        let mean = self.sum / f64::from(self.samples);
        if field.is_soc() {
            Some((mean * SOC_SCALE).round() / SOC_SCALE)
        } else {
            Some(mean.round())
        }
    }
}

/// Sum and count per field for one output bucket.
#[derive(Debug, Default)]
struct BucketAccumulator {
    fields: [FieldAccumulator; Field::COUNT],
}

impl BucketAccumulator {
    fn add(&mut self, sample: &Sample) {
        for field in Field::ALL {
            if let Some(value) = sample.get(field) {
                self.fields[field.index()].add(value);
            }
        }
    }

    fn finish(&self, time: DateTime<Utc>) -> Sample {
        let mut sample = Sample::new(time);
        for field in Field::ALL {
            sample.set(field, self.fields[field.index()].average(field));
        }
        sample
    }
}

/// Resample a time-ordered dataset into buckets of `bucket_seconds`.
///
/// Emits one sample per bucket from the first input timestamp until every
/// input sample is consumed, including empty buckets inside gaps and a
/// partially filled final bucket.
///
/// # Errors
///
/// [`AnalyzerError::InvalidArgument`] if `bucket_seconds < 1`, `data` is
/// empty, or `data` is not ordered by time.
pub fn resample(data: &[Sample], bucket_seconds: i64) -> Result<Dataset> {
    if bucket_seconds < 1 {
        return Err(AnalyzerError::InvalidArgument(format!(
            "bucket width must be at least 1 second, got {bucket_seconds}"
        )));
    }
    let width = TimeDelta::try_seconds(bucket_seconds).ok_or_else(|| {
        AnalyzerError::InvalidArgument(format!("bucket width {bucket_seconds}s is out of range"))
    })?;
    let first = data.first().ok_or_else(|| {
        AnalyzerError::InvalidArgument("cannot resample an empty dataset".to_string())
    })?;
    if let Some(pos) = data.windows(2).position(|w| w[1].time < w[0].time) {
        return Err(AnalyzerError::InvalidArgument(format!(
            "dataset is not ordered by time at index {}",
            pos + 1
        )));
    }

    debug!(entries = data.len(), bucket_seconds, "resampling");

    let mut result = Vec::new();
    let mut bucket_start = first.time;
    let mut index = 0;
    while index < data.len() {
        let bucket_end = bucket_start.checked_add_signed(width).ok_or_else(|| {
            AnalyzerError::InvalidArgument("bucket boundary overflows the time range".to_string())
        })?;

        let mut bucket = BucketAccumulator::default();
        while index < data.len() && data[index].time < bucket_end {
            bucket.add(&data[index]);
            index += 1;
        }
        result.push(bucket.finish(bucket_start));
        bucket_start = bucket_end;
    }

    debug!(entries = result.len(), "resampled");
    Ok(result)
}
