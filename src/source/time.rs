//! Timestamp parsing and day-bucket derivation. Neither ever fails: bad input means "unknown".

use super::{FieldValue, Record};
use crate::config::FieldKeys;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DAY_LEN: usize = 10;

/// Interpret a field as a wall-clock instant.
///
/// Integers and floats are UTC epoch seconds, offsets count from 1970-01-01, strings may be
/// RFC 3339 (the offset is dropped, local fields kept), `YYYY-MM-DD[T ]HH:MM:SS[.f]` or a bare
/// date at midnight.
pub fn parse_timestamp(value: &FieldValue) -> Option<NaiveDateTime> {
    match value {
        FieldValue::Timestamp(ts) => Some(*ts),
        FieldValue::Offset(d) => NaiveDateTime::default().checked_add_signed(*d),
        FieldValue::Int(secs) => DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc()),
        FieldValue::Float(f) => from_float_secs(*f),
        FieldValue::Str(s) => parse_str(s.trim()),
        FieldValue::Null | FieldValue::Bool(_) => None,
    }
}

fn from_float_secs(f: f64) -> Option<NaiveDateTime> {
    if !f.is_finite() || f.abs() >= i64::MAX as f64 {
        return None;
    }
    let secs = f.floor();
    let nanos = ((f - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos).map(|dt| dt.naive_utc())
}

fn parse_str(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s.trim_end_matches('Z'), fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Day bucket of a record: the explicit date field cut to 10 characters, else the calendar
/// date of its timestamp, else `None`.
pub fn day_of(record: &Record, keys: &FieldKeys) -> Option<String> {
    if record.is_truthy(&keys.date) {
        return record
            .token(&keys.date)
            .map(|d| d.chars().take(DAY_LEN).collect());
    }
    record
        .timestamp(&keys.timestamp)
        .map(|ts| ts.date().format("%Y-%m-%d").to_string())
}
