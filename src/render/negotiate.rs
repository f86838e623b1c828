//! Content negotiation.
//!
//! # Responsibilities
//! - Map a route suffix to a format (explicit override)
//! - Otherwise pick the first of json, xml, csv named in `Accept`
//! - Signal `Unacceptable` when neither applies
//!
//! # Design Decisions
//! - `Accept` is checked by plain substring containment, no q-values
//! - Wildcards are not matches: `*/*` and a missing header are `Unacceptable`
//! - Media type matching is case-sensitive

use thiserror::Error;

use crate::render::Format;

/// No format could be chosen for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no acceptable representation")]
pub struct Unacceptable;

/// Select a format from a route suffix and an `Accept` header value.
pub fn negotiate(suffix: Option<&str>, accept: Option<&str>) -> Result<Format, Unacceptable> {
    if let Some(format) = suffix.and_then(Format::from_suffix) {
        return Ok(format);
    }

    let accept = accept.ok_or(Unacceptable)?;
    Format::ALL
        .into_iter()
        .find(|format| accept.contains(format.media_type()))
        .ok_or(Unacceptable)
}

/// Split a path segment like `Anna.json` into (`Anna`, Json).
///
/// Returns `None` unless the segment ends with a known suffix.
pub fn strip_format_suffix(segment: &str) -> Option<(&str, Format)> {
    Format::ALL.into_iter().find_map(|format| {
        segment
            .strip_suffix(format.suffix())
            .map(|stem| (stem, format))
    })
}
