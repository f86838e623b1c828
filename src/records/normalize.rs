//! Result normalization: raw source rows into a typed `ResultSet`.
//!
//! # Responsibilities
//! - Enforce row arity against the schema
//! - Decode byte-oriented text into UTF-8 strings
//! - Coerce each raw value into its declared kind
//! - Convert timestamps into a single UTC instant

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

use crate::records::value::decimal_text;
use crate::records::{Record, ResultSet, Schema, Value, ValueKind};
use crate::store::{RawRow, RawValue};

/// Contract violations between the record source and the normalizer.
///
/// None of these are the caller's fault; they all surface as server errors.
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("malformed row: expected {expected} columns, got {actual}")]
    MalformedRow { expected: usize, actual: usize },

    #[error("field `{field}` is not valid UTF-8")]
    InvalidText { field: &'static str },

    #[error("field `{field}` cannot be read as {kind}")]
    TypeMismatch {
        field: &'static str,
        kind: ValueKind,
    },
}

/// Normalize raw rows according to `schema`.
pub fn normalize(rows: Vec<RawRow>, schema: &Schema) -> Result<ResultSet, NormalizeError> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != schema.fields.len() {
            return Err(NormalizeError::MalformedRow {
                expected: schema.fields.len(),
                actual: row.len(),
            });
        }

        let mut record = Record::with_capacity(row.len());
        for (field, raw) in schema.fields.iter().zip(row) {
            let value = coerce(raw, field.kind).map_err(|e| e.for_field(field.name))?;
            record.push(field.name, value);
        }
        records.push(record);
    }
    Ok(ResultSet::new(schema, records))
}

enum Coercion {
    InvalidText,
    Mismatch(ValueKind),
}

impl Coercion {
    fn for_field(self, field: &'static str) -> NormalizeError {
        match self {
            Coercion::InvalidText => NormalizeError::InvalidText { field },
            Coercion::Mismatch(kind) => NormalizeError::TypeMismatch { field, kind },
        }
    }
}

fn coerce(raw: RawValue, kind: ValueKind) -> Result<Value, Coercion> {
    let raw = match raw {
        RawValue::Null => return Ok(Value::Null),
        RawValue::Bytes(bytes) => {
            RawValue::Text(String::from_utf8(bytes).map_err(|_| Coercion::InvalidText)?)
        }
        other => other,
    };

    let value = match (kind, raw) {
        (ValueKind::Text, RawValue::Text(s)) => Value::Text(s),
        (ValueKind::Text, RawValue::Integer(i)) => Value::Text(i.to_string()),
        (ValueKind::Text, RawValue::Real(r)) => {
            Value::Text(decimal_text(r).unwrap_or_else(|| r.to_string()))
        }

        (ValueKind::Integer, RawValue::Integer(i)) => Value::Integer(i),
        (ValueKind::Integer, RawValue::Real(r)) if r.fract() == 0.0 && r.abs() < 9.0e15 => {
            Value::Integer(r as i64)
        }
        (ValueKind::Integer, RawValue::Text(s)) => Value::Integer(
            s.trim()
                .parse()
                .map_err(|_| Coercion::Mismatch(kind))?,
        ),

        (ValueKind::Decimal, RawValue::Real(r)) => Value::from(Some(r)),
        (ValueKind::Decimal, RawValue::Integer(i)) => Value::Decimal(i as f64),
        (ValueKind::Decimal, RawValue::Text(s)) => Value::from(Some(
            s.trim()
                .parse::<f64>()
                .map_err(|_| Coercion::Mismatch(kind))?,
        )),

        (ValueKind::Timestamp, RawValue::Integer(secs)) => Value::Timestamp(
            Utc.timestamp_opt(secs, 0)
                .single()
                .ok_or(Coercion::Mismatch(kind))?,
        ),
        (ValueKind::Timestamp, RawValue::Real(secs)) if secs.is_finite() => {
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            Value::Timestamp(
                Utc.timestamp_opt(whole as i64, nanos)
                    .single()
                    .ok_or(Coercion::Mismatch(kind))?,
            )
        }
        (ValueKind::Timestamp, RawValue::Text(s)) => {
            Value::Timestamp(parse_timestamp(s.trim()).ok_or(Coercion::Mismatch(kind))?)
        }

        _ => return Err(Coercion::Mismatch(kind)),
    };
    Ok(value)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}
