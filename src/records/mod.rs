//! Canonical records: the contract between storage and rendering.
//!
//! # Data Flow
//! ```text
//! RecordSource rows (RawValue tuples)
//!     → normalize.rs (arity check, decoding, kind coercion)
//!     → ResultSet (ordered, typed, same fields for every record)
//!     → [optional enrichment fields appended]
//!     → render (JSON / XML / CSV)
//! ```
//!
//! # Design Decisions
//! - Field names are static: every schema is known at compile time
//! - A `ResultSet` owns its field list so empty sets still render headers
//! - Fields are only added set-wide, never to a single record

pub mod normalize;
pub mod value;

pub use normalize::{normalize, NormalizeError};
pub use value::{TimestampStyle, Value, ValueKind};

/// A declared column: name and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: ValueKind,
}

impl Field {
    pub const fn new(name: &'static str, kind: ValueKind) -> Self {
        Self { name, kind }
    }
}

/// Entity naming plus the ordered field list of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    /// Plural name, used as JSON key and XML root (`persons`).
    pub collection: &'static str,
    /// Singular name, used as XML element (`person`).
    pub element: &'static str,
    pub fields: &'static [Field],
}

/// Fields returned by the list and search queries.
pub const PERSON_SUMMARY: Schema = Schema {
    collection: "persons",
    element: "person",
    fields: &[
        Field::new("person_id", ValueKind::Integer),
        Field::new("name", ValueKind::Text),
        Field::new("address", ValueKind::Text),
    ],
};

/// Fields returned by the detail query, before enrichment.
pub const PERSON_DETAIL: Schema = Schema {
    collection: "persons",
    element: "person",
    fields: &[
        Field::new("name", ValueKind::Text),
        Field::new("address", ValueKind::Text),
        Field::new("phone", ValueKind::Text),
        Field::new("income", ValueKind::Decimal),
        Field::new("birth_date", ValueKind::Timestamp),
    ],
};

/// One entity instance as an ordered field-name → value mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    entries: Vec<(&'static str, Value)>,
}

impl Record {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, value: Value) {
        self.entries.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.entries.iter().map(|(name, value)| (*name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A materialized, bounded sequence of records sharing one field list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    collection: &'static str,
    element: &'static str,
    fields: Vec<&'static str>,
    records: Vec<Record>,
}

impl ResultSet {
    pub(crate) fn new(schema: &Schema, records: Vec<Record>) -> Self {
        Self {
            collection: schema.collection,
            element: schema.element,
            fields: schema.fields.iter().map(|f| f.name).collect(),
            records,
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    pub fn element(&self) -> &'static str {
        self.element
    }

    /// Field names in record order.
    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a field to every record, computing its value from the record.
    pub fn append_field<F>(&mut self, name: &'static str, mut value_of: F)
    where
        F: FnMut(&Record) -> Value,
    {
        for record in &mut self.records {
            let value = value_of(record);
            record.push(name, value);
        }
        self.fields.push(name);
    }
}
