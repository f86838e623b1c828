//! JSON renderer.
//!
//! Collections are wrapped as `{"<collection>": [ {...}, ... ]}`; a single
//! record is the bare object. Keys follow record order.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::records::{Record, ResultSet};
use crate::render::{RenderError, Shape};

pub fn render(set: &ResultSet, shape: Shape) -> Result<Vec<u8>, RenderError> {
    let body = match shape {
        Shape::Collection => serde_json::to_vec(&Envelope(set))?,
        Shape::Single => serde_json::to_vec(set.first().ok_or(RenderError::Empty)?)?,
    };
    Ok(body)
}

struct Envelope<'a>(&'a ResultSet);

struct Records<'a>(&'a [Record]);

impl Serialize for Envelope<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0.collection(), &Records(self.0.records()))?;
        map.end()
    }
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for record in self.0 {
            seq.serialize_element(record)?;
        }
        seq.end()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
