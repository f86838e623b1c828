//! Record source subsystem.
//!
//! # Data Flow
//! ```text
//! handler builds Query
//!     → RecordSource::fetch (blocking, on the blocking pool)
//!     → Vec<RawRow> in the column order of Query::schema()
//!     → records::normalize
//! ```
//!
//! # Design Decisions
//! - The trait is synchronous; callers move it onto `spawn_blocking`
//! - Each query owns its schema so column layout is never implicit
//! - Connections are scoped to a single `fetch` call

pub mod sqlite;

use thiserror::Error;

use crate::records::{Schema, PERSON_DETAIL, PERSON_SUMMARY};

pub use sqlite::SqliteRecordSource;

/// Maximum number of rows any query returns.
pub const ROW_CAP: u32 = 50;

/// A raw column value as delivered by the store.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    /// Byte-oriented text or blobs; decoded by the normalizer.
    Bytes(Vec<u8>),
}

/// One row in the column order declared by the query's schema.
pub type RawRow = Vec<RawValue>;

/// Read queries the service can run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// All persons, capped at [`ROW_CAP`].
    ListAll,
    ById(i64),
    /// Case-insensitive literal substring of the address.
    AddressContains(String),
    /// Case-insensitive literal substring of the name.
    NameContains(String),
}

impl Query {
    pub fn schema(&self) -> &'static Schema {
        match self {
            Query::ById(_) => &PERSON_DETAIL,
            Query::ListAll | Query::AddressContains(_) | Query::NameContains(_) => &PERSON_SUMMARY,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Query::ListAll => "list",
            Query::ById(_) => "by_id",
            Query::AddressContains(_) => "by_address",
            Query::NameContains(_) => "by_name",
        }
    }
}

/// Errors raised by a record source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),
}

/// Executes queries against the backing store.
pub trait RecordSource: Send + Sync {
    fn fetch(&self, query: &Query) -> Result<Vec<RawRow>, SourceError>;
}
