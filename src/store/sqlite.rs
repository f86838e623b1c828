//! SQLite-backed record source.
//!
//! # Responsibilities
//! - Open a read-only connection per fetch, closed on every exit path
//! - Run the fixed query for each `Query` variant
//! - Escape user substrings so `%` and `_` match literally
//! - Fold case with full Unicode lowercasing, not SQLite's ASCII-only rules

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Params};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::store::{Query, RawRow, RawValue, RecordSource, SourceError, ROW_CAP};

const LIST_SQL: &str = "SELECT person_id, name, address FROM persons ORDER BY person_id LIMIT ?1";

const DETAIL_SQL: &str =
    "SELECT name, address, phone, income, birth_date FROM persons WHERE person_id = ?1";

const BY_ADDRESS_SQL: &str = "SELECT person_id, name, address FROM persons \
     WHERE fold(address) LIKE ?1 ESCAPE '\\' ORDER BY person_id LIMIT ?2";

const BY_NAME_SQL: &str = "SELECT person_id, name, address FROM persons \
     WHERE fold(name) LIKE ?1 ESCAPE '\\' ORDER BY person_id LIMIT ?2";

/// Record source reading the `persons` table of a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteRecordSource {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteRecordSource {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            path: PathBuf::from(&config.path),
            busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        }
    }

    fn open(&self) -> Result<Connection, SourceError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|e| {
            SourceError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;
        register_fold(&conn).map_err(|e| SourceError::Unavailable(e.to_string()))?;
        Ok(conn)
    }
}

impl RecordSource for SqliteRecordSource {
    fn fetch(&self, query: &Query) -> Result<Vec<RawRow>, SourceError> {
        let conn = self.open()?;
        let rows = match query {
            Query::ListAll => collect_rows(&conn, LIST_SQL, params![ROW_CAP]),
            Query::ById(id) => collect_rows(&conn, DETAIL_SQL, params![id]),
            Query::AddressContains(s) => collect_rows(&conn, BY_ADDRESS_SQL, params![like_pattern(s), ROW_CAP]),
            Query::NameContains(s) => collect_rows(&conn, BY_NAME_SQL, params![like_pattern(s), ROW_CAP]),
        };
        let rows = rows.map_err(|e| SourceError::Query(e.to_string()))?;

        tracing::debug!(query = query.label(), rows = rows.len(), "Query complete");
        Ok(rows)
    }
}

fn collect_rows<P: Params>(conn: &Connection, sql: &str, params: P) -> rusqlite::Result<Vec<RawRow>> {
    let mut stmt = conn.prepare(sql)?;
    let columns = stmt.column_count();
    let rows = stmt.query_map(params, |row| {
        (0..columns)
            .map(|i| row.get_ref(i).map(RawValue::from))
            .collect::<rusqlite::Result<RawRow>>()
    })?;
    rows.collect()
}

impl From<ValueRef<'_>> for RawValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => RawValue::Null,
            ValueRef::Integer(i) => RawValue::Integer(i),
            ValueRef::Real(r) => RawValue::Real(r),
            ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => RawValue::Text(s.to_owned()),
                Err(_) => RawValue::Bytes(bytes.to_vec()),
            },
            ValueRef::Blob(bytes) => RawValue::Bytes(bytes.to_vec()),
        }
    }
}

/// `fold(x)`: Unicode lowercase of a text value, NULL stays NULL.
fn register_fold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let folded = match ctx.get_raw(0) {
                ValueRef::Null => None,
                ValueRef::Integer(i) => Some(i.to_string()),
                ValueRef::Real(r) => Some(r.to_string()),
                ValueRef::Text(b) | ValueRef::Blob(b) => Some(String::from_utf8_lossy(b).to_lowercase()),
            };
            Ok(folded)
        },
    )
}

/// Build a `LIKE ... ESCAPE '\'` pattern matching `needle` as a literal substring.
pub(crate) fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
