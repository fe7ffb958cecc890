//! Parses `latitude,longitude,timestamp[,accuracy]` text into telemetry samples.

use serde::Serialize;

use crate::error::RecordError;
use crate::types::TelemetrySample;

/// A line that was dropped during parsing, with its 1-based line number
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RejectedLine {
    pub line_number: usize,
    #[serde(serialize_with = "serialize_reason")]
    pub reason: RecordError,
}

fn serialize_reason<S: serde::Serializer>(reason: &RecordError, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&reason.to_string())
}

/// Accuracy recorded for a field that is present but not a usable distance.
/// NaN compares false against every threshold.
pub const INVALID_ACCURACY: f64 = f64::NAN;

/// Result of parsing a block of telemetry text. Samples keep input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedRecords {
    pub samples: Vec<TelemetrySample>,
    pub rejected: Vec<RejectedLine>,
}

/// Parse every non-blank line of `text`.
///
/// Malformed lines never abort the batch; they are collected in `rejected` instead.
pub fn parse_records(text: &str) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(sample) => parsed.samples.push(sample),
            Err(reason) => {
                log::debug!("Dropping line {}: {}", idx + 1, reason);
                parsed.rejected.push(RejectedLine {
                    line_number: idx + 1,
                    reason,
                });
            }
        }
    }

    parsed
}

/// Parse a single record line.
///
/// Latitude, longitude and timestamp must be finite numbers. Beyond that, lines are also
/// rejected when latitude is outside +-90, longitude outside +-180, or the timestamp has
/// a fractional millisecond. A present but unusable accuracy does not drop the line; it
/// becomes [`INVALID_ACCURACY`] so the sample fails any accuracy check.
pub fn parse_line(line: &str) -> Result<TelemetrySample, RecordError> {
    let mut fields = line.split(',').map(str::trim);

    let latitude = parse_coordinate(fields.next(), "latitude", 90.0)?;
    let longitude = parse_coordinate(fields.next(), "longitude", 180.0)?;
    let timestamp_millis = parse_timestamp(fields.next())?;
    let accuracy_meters = parse_accuracy(fields.next());

    Ok(TelemetrySample {
        latitude,
        longitude,
        timestamp_millis,
        accuracy_meters,
    })
}

/// Stable sort by timestamp; samples sharing a timestamp keep their relative order.
pub fn sort_by_time(samples: &mut [TelemetrySample]) {
    samples.sort_by_key(|s| s.timestamp_millis);
}

fn parse_finite(raw: Option<&str>, field: &'static str) -> Result<f64, RecordError> {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return Err(RecordError::MissingField(field)),
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(RecordError::InvalidNumber {
            field,
            value: raw.to_string(),
        }),
    }
}

fn parse_coordinate(raw: Option<&str>, field: &'static str, limit: f64) -> Result<f64, RecordError> {
    let value = parse_finite(raw, field)?;
    if value.abs() > limit {
        return Err(RecordError::OutOfRange { field, value });
    }
    Ok(value)
}

fn parse_timestamp(raw: Option<&str>) -> Result<i64, RecordError> {
    const FIELD: &str = "timestamp";
    if let Some(Ok(ms)) = raw.map(str::parse::<i64>) {
        return Ok(ms);
    }
    // Exported logs sometimes write "1700000000000.0"
    let value = parse_finite(raw, FIELD)?;
    if value.fract() != 0.0 || value.abs() >= i64::MAX as f64 {
        return Err(RecordError::InvalidNumber {
            field: FIELD,
            value: raw.unwrap_or_default().to_string(),
        });
    }
    Ok(value as i64)
}

fn parse_accuracy(raw: Option<&str>) -> Option<f64> {
    match raw {
        None | Some("") => None,
        Some(text) => match text.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
            _ => {
                log::debug!("Unusable accuracy {:?}, sample kept as inaccurate", text);
                Some(INVALID_ACCURACY)
            }
        },
    }
}
