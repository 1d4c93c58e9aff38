//! Decoder for the per-device VoltStorage CSV export.
//!
//! The export starts with a `sep=;` directive and a header line, followed by
//! one semicolon-separated row per reported minute. Each device role owns a
//! fixed subset of the columns (see [`DeviceRole::columns`]); signed power
//! readings are split into non-negative from/to pairs.
//!
//! Decoding is lenient: a row whose time cannot be parsed is skipped, a row
//! with an unparsable measurement is kept with only its time populated.

use std::borrow::Cow;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::config::EXPORT_SEPARATOR;
use crate::error::{AnalyzerError, Result};
use crate::models::{ColumnTarget, Dataset, DeviceRole, Sample, COL_TIME};

const SEPARATOR_DIRECTIVE: &str = "sep=;";
const PREAMBLE_LINES: usize = 2;

/// Decode one device's raw export into samples, in file order.
///
/// Empty or header-only input yields an empty dataset.
pub fn decode(raw: &str, role: DeviceRole) -> Dataset {
    let raw = repair_separator(raw);
    debug!(?role, size = raw.len(), "decoding raw export");

    let mut reader = ReaderBuilder::new()
        .delimiter(EXPORT_SEPARATOR as u8)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    let mut data = Vec::new();
    for (index, result) in reader.records().enumerate() {
        if index < PREAMBLE_LINES {
            continue;
        }
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping unreadable raw line {}: {}", index + 1, e);
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        match decode_record(&record, role) {
            Ok(sample) => data.push(sample),
            Err(e) => warn!("skipping raw line {}: {}", index + 1, e),
        }
    }

    let time_only = data.iter().filter(|s| !s.has_readings()).count();
    if time_only > 0 {
        warn!(?role, time_only, "raw export has rows without any reading");
    }
    debug!(?role, entries = data.len(), "raw export decoded");
    data
}

/// Fix exports that ignored the requested `;` separator.
///
/// The API has been seen to honour `separator=;` in the directive and header
/// while still writing data rows with `,`. In that case every `,` is replaced.
pub fn repair_separator(raw: &str) -> Cow<'_, str> {
    let mut lines = raw.lines();
    if lines.next().map(str::trim) != Some(SEPARATOR_DIRECTIVE) {
        return Cow::Borrowed(raw);
    }
    let first_row = match lines.nth(1) {
        Some(line) => line,
        None => return Cow::Borrowed(raw),
    };
    if !first_row.contains(EXPORT_SEPARATOR) && first_row.contains(',') {
        warn!("wrong column separator in export, replacing ',' with ';'");
        return Cow::Owned(raw.replace(',', ";"));
    }
    Cow::Borrowed(raw)
}

fn decode_record(record: &StringRecord, role: DeviceRole) -> Result<Sample> {
    let time = parse_timestamp(record.get(COL_TIME).unwrap_or(""))?;
    let mut sample = Sample::new(time);

    if let Err(e) = apply_columns(&mut sample, record, role) {
        warn!("{} at {}, keeping time only", e, time);
        return Ok(Sample::new(time));
    }
    Ok(sample)
}

fn apply_columns(sample: &mut Sample, record: &StringRecord, role: DeviceRole) -> Result<()> {
    for mapping in role.columns() {
        let text = match record.get(mapping.column) {
            Some(text) if !text.is_empty() => text,
            _ => continue,
        };
        match mapping.target {
            ColumnTarget::Split { positive, negative } => {
                let watts = parse_watts(text)?;
                let (pos, neg) = split_signed(watts);
                sample.set(positive, Some(pos as f64));
                sample.set(negative, Some(neg as f64));
            }
            ColumnTarget::Power(field) => {
                sample.set(field, Some(parse_watts(text)? as f64));
            }
            ColumnTarget::Fraction(field) => {
                sample.set(field, Some(parse_fraction(text)?));
            }
        }
    }
    Ok(())
}

/// Split a signed reading into `(positive, magnitude of negative)`.
pub fn split_signed(value: i64) -> (i64, i64) {
    if value > 0 {
        (value, 0)
    } else if value < 0 {
        (0, value.saturating_neg())
    } else {
        (0, 0)
    }
}

/// Parse a power value as whole watts, truncating any fractional part.
///
/// Values outside `i64::MIN + 1 ..= i64::MAX` are rejected so that every
/// accepted reading can be negated.
pub(crate) fn parse_watts(text: &str) -> Result<i64> {
    let invalid = || AnalyzerError::MalformedInput(format!("invalid power value '{text}'"));
    if let Ok(v) = text.parse::<i64>() {
        return if v == i64::MIN { Err(invalid()) } else { Ok(v) };
    }
    // i64::MAX as f64 rounds up to 2^63, so both bounds are exclusive
    let limit = i64::MAX as f64;
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v > -limit && v < limit => Ok(v.trunc() as i64),
        _ => Err(invalid()),
    }
}

pub(crate) fn parse_fraction(text: &str) -> Result<f64> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(AnalyzerError::MalformedInput(format!(
            "invalid fractional value '{text}'"
        ))),
    }
}

/// Parse an RFC 3339 timestamp, the codec's minute form (`2021-05-15T10:42Z`)
/// or a naive `YYYY-MM-DD HH:MM:SS` UTC time.
pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(text) {
        return Ok(t.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%MZ", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(t.and_utc());
        }
    }
    Err(AnalyzerError::MalformedInput(format!(
        "invalid timestamp '{text}'"
    )))
}
