//! Text encoding of a unified dataset for the store.
//!
//! One header line, then one semicolon-separated line per sample: the time at
//! minute precision (`2021-05-15T10:42Z`) followed by the fields in
//! [`Field::ALL`] order. Absent values are written as empty fields and read
//! back as absent, a measured `0` stays `0`.

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Terminator, Trim, WriterBuilder};
use tracing::{debug, warn};

use crate::config::EXPORT_SEPARATOR;
use crate::decoder::{parse_fraction, parse_timestamp, parse_watts};
use crate::error::{AnalyzerError, Result};
use crate::models::{Dataset, Field, Sample};

pub const TIME_COLUMN: &str = "dateTime";
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%MZ";

/// Header line of the encoded format, without line terminator.
pub fn header() -> String {
    let mut cols = vec![TIME_COLUMN];
    cols.extend(Field::ALL.iter().map(|f| f.name()));
    cols.join(";")
}

/// Encode a dataset. Timestamps lose their seconds.
pub fn encode(data: &[Sample]) -> Result<String> {
    debug!(entries = data.len(), "encoding dataset");

    let mut writer = WriterBuilder::new()
        .delimiter(EXPORT_SEPARATOR as u8)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let mut header_row = vec![TIME_COLUMN.to_string()];
    header_row.extend(Field::ALL.iter().map(|f| f.name().to_string()));
    writer.write_record(&header_row)?;

    for sample in data {
        let mut row = Vec::with_capacity(Field::COUNT + 1);
        row.push(format_time(sample.time));
        row.extend(Field::ALL.iter().map(|f| format_value(sample, *f)));
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AnalyzerError::Io(e.into_error()))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| AnalyzerError::MalformedInput(format!("encoded dataset is not UTF-8: {e}")))?;

    debug!(size = text.len(), "dataset encoded");
    Ok(text)
}

/// Decode an encoded dataset.
///
/// Lines with fewer than two columns or an unreadable time are skipped, an
/// unparsable value is read as absent. Never fails as a whole.
pub fn decode(text: &str) -> Dataset {
    debug!(size = text.len(), "decoding dataset");

    let mut reader = ReaderBuilder::new()
        .delimiter(EXPORT_SEPARATOR as u8)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut data = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("skipping unreadable dataset line: {}", e);
                continue;
            }
        };
        if record.len() < 2 {
            debug!("skipping line with too few columns: {:?}", record);
            continue;
        }
        let time = match parse_timestamp(&record[0]) {
            Ok(time) => time,
            Err(e) => {
                warn!("skipping dataset line: {}", e);
                continue;
            }
        };

        let mut sample = Sample::new(time);
        for (i, field) in Field::ALL.iter().enumerate() {
            let text = record.get(i + 1).unwrap_or("");
            sample.set(*field, parse_value(*field, text));
        }
        data.push(sample);
    }

    debug!(entries = data.len(), "dataset decoded");
    data
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn format_value(sample: &Sample, field: Field) -> String {
    match sample.get(field) {
        None => String::new(),
        Some(v) if field.is_soc() => v.to_string(),
        Some(v) => (v as i64).to_string(),
    }
}

fn parse_value(field: Field, text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    let parsed = if field.is_soc() {
        parse_fraction(text)
    } else {
        parse_watts(text).map(|v| v as f64)
    };
    match parsed {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("{} in column {}, reading as absent", e, field.name());
            None
        }
    }
}
