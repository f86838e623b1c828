//! Typed field values and their textual forms.
//!
//! # Design Decisions
//! - One canonical form per kind; renderers derive text from it, never re-parse
//! - Timestamps are UTC instants; ISO-8601 for JSON/XML, plain form for CSV
//! - Decimals print with the same digits JSON uses so every format agrees

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::borrow::Cow;

/// Declared kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Decimal,
    Timestamp,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Decimal => "decimal",
            ValueKind::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single normalized field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i64),
    /// Always finite; the normalizer maps NaN and infinities to `Null`.
    Decimal(f64),
    Timestamp(DateTime<Utc>),
}

/// How a timestamp is spelled in a text-based format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampStyle {
    /// `1990-05-17T00:00:00Z`
    Iso8601,
    /// `1990-05-17 00:00:00`
    Plain,
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Text form used by the XML and CSV renderers.
    ///
    /// Returns `None` for null so each format can decide how to spell absence.
    pub fn to_text(&self, style: TimestampStyle) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Text(s) => Some(Cow::Borrowed(s)),
            Value::Integer(i) => Some(Cow::Owned(i.to_string())),
            Value::Decimal(d) => decimal_text(*d).map(Cow::Owned),
            Value::Timestamp(ts) => Some(Cow::Owned(match style {
                TimestampStyle::Iso8601 => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
                TimestampStyle::Plain => ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            })),
        }
    }
}

/// Shortest round-trip digits, as JSON prints them; `None` when not finite.
pub(crate) fn decimal_text(d: f64) -> Option<String> {
    serde_json::Number::from_f64(d).map(|n| n.to_string())
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Decimal(d) if d.is_finite() => serializer.serialize_f64(*d),
            Value::Decimal(_) => serializer.serialize_none(),
            Value::Timestamp(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
        }
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(d) if d.is_finite() => Value::Decimal(d),
            _ => Value::Null,
        }
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map(Value::Text).unwrap_or(Value::Null)
    }
}
