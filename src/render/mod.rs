//! Response rendering subsystem.
//!
//! # Data Flow
//! ```text
//! route suffix / Accept header
//!     → negotiate.rs (pick exactly one Format, or Unacceptable)
//! ResultSet + Format + Shape
//!     → json.rs | xml.rs | csv.rs
//!     → Payload (bytes + media type)
//! ```
//!
//! # Design Decisions
//! - Renderers are pure functions; no state survives a request
//! - All formats read the same field list in the same order
//! - Encoding failures are errors for one request, never panics

pub mod csv;
pub mod json;
pub mod negotiate;
pub mod xml;

use thiserror::Error;

use crate::records::ResultSet;

pub use negotiate::{negotiate, strip_format_suffix, Unacceptable};

/// Wire formats the service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
    Csv,
}

impl Format {
    /// Formats in `Accept` header priority order.
    pub const ALL: [Format; 3] = [Format::Json, Format::Xml, Format::Csv];

    pub fn suffix(self) -> &'static str {
        match self {
            Format::Json => ".json",
            Format::Xml => ".xml",
            Format::Csv => ".csv",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "application/xml",
            Format::Csv => "text/csv",
        }
    }

    /// Value for the `Content-Type` response header.
    pub fn content_type(self) -> &'static str {
        match self {
            Format::Csv => "text/csv; charset=utf-8",
            other => other.media_type(),
        }
    }

    /// Exact suffix match (`.json`, `.xml`, `.csv`).
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.suffix() == suffix)
    }
}

/// Whether a result set is rendered as a collection or as its only record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Collection,
    Single,
}

/// Rendering failures. Each one fails only the current request.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("XML encoding failed: {0}")]
    Xml(String),

    #[error("field `{field}` contains U+{codepoint:04X}, which XML cannot represent")]
    Unrepresentable { field: &'static str, codepoint: u32 },

    #[error("single-record rendering requested for an empty result set")]
    Empty,
}

/// Encoded response body with its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    format: Format,
    body: Vec<u8>,
}

impl Payload {
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn media_type(&self) -> &'static str {
        self.format.media_type()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Vec<u8> {
        self.body
    }
}

/// Render `set` in `format`.
pub fn render(format: Format, set: &ResultSet, shape: Shape) -> Result<Payload, RenderError> {
    let body = match format {
        Format::Json => json::render(set, shape)?,
        Format::Xml => xml::render(set, shape)?,
        Format::Csv => self::csv::render(set, shape)?,
    };
    Ok(Payload { format, body })
}
