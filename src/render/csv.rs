//! CSV renderer: header row of field names, then one row per record.
//!
//! Quoting is left to the `csv` writer (necessary-only: fields with a comma,
//! double quote, or line break are quoted, inner quotes doubled). Null is an
//! empty field.

use csv::{Terminator, WriterBuilder};
use std::borrow::Cow;

use crate::records::{ResultSet, TimestampStyle};
use crate::render::{RenderError, Shape};

pub fn render(set: &ResultSet, shape: Shape) -> Result<Vec<u8>, RenderError> {
    let records = match shape {
        Shape::Collection => set.records(),
        Shape::Single => {
            set.first().ok_or(RenderError::Empty)?;
            &set.records()[..1]
        }
    };

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(set.fields())?;
    for record in records {
        let row: Vec<Cow<'_, str>> = record
            .iter()
            .map(|(_, value)| value.to_text(TimestampStyle::Plain).unwrap_or_default())
            .collect();
        writer.write_record(row.iter().map(|field| field.as_bytes()))?;
    }

    writer
        .into_inner()
        .map_err(|e| RenderError::Csv(csv::Error::from(e.into_error())))
}
