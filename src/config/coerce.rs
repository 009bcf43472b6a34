//! Raw JSON value stringification and typed coercion.
//!
//! Conflict detection compares raw values by their string form, so `8080`
//! and `"8080"` are the same setting. Coercion accepts either form for
//! numbers and booleans.

use super::duration::parse_duration;
use super::types::{FieldType, FieldValue};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Number, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoerceError {
    #[error("{kind} {value}")]
    Invalid { kind: &'static str, value: String },

    #[error("unsupported type {0}")]
    Unsupported(String),
}

/// Name of a JSON value's kind, for diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// String form of a raw value: strings as-is, scalars printed, containers as compact JSON.
///
/// Whole-valued floats print as integers, so `1000`, `1000.0` and `1e3` agree.
pub fn raw_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => number_string(n),
        other => other.to_string(),
    }
}

fn number_string(n: &Number) -> String {
    if n.is_f64() {
        if let Some(whole) = n.as_f64().and_then(whole_i64) {
            return whole.to_string();
        }
    }
    n.to_string()
}

fn whole_i64(f: f64) -> Option<i64> {
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

/// Accepts the same spellings as the usual `true`/`false` flag parsers.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn parse_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_real(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Full RFC 3339 date-time first, then a bare `YYYY-MM-DD` at midnight UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Coerce a raw JSON value to a field's semantic type.
pub fn coerce(raw: &Value, field_type: &FieldType) -> Result<FieldValue, CoerceError> {
    let text = raw_string(raw);
    let invalid = |kind: &'static str| CoerceError::Invalid {
        kind,
        value: text.clone(),
    };

    match field_type {
        FieldType::Text => Ok(FieldValue::Text(text.clone())),
        FieldType::Real => parse_real(raw)
            .map(FieldValue::Real)
            .ok_or_else(|| invalid("real")),
        FieldType::Integer => parse_integer(raw)
            .map(FieldValue::Integer)
            .ok_or_else(|| invalid("integer")),
        FieldType::Boolean => match raw {
            Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            _ => parse_bool(&text)
                .map(FieldValue::Boolean)
                .ok_or_else(|| invalid("boolean")),
        },
        FieldType::Duration => parse_duration(&text)
            .map(FieldValue::Duration)
            .map_err(|_| invalid("duration")),
        FieldType::Timestamp => parse_timestamp(&text)
            .map(FieldValue::Timestamp)
            .ok_or_else(|| invalid("timestamp")),
        FieldType::Unsupported(name) => Err(CoerceError::Unsupported(name.clone())),
    }
}
