//! Route handlers.
//!
//! Each handler parses its path segment, runs one query, and renders the
//! result. Only the detail handler calls the enrichment client.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::records::Value;
use crate::render::{negotiate, render, strip_format_suffix, Payload, Shape};
use crate::store::Query;

/// `GET /persons{ext}`: every person, format from suffix or `Accept`.
pub async fn list_persons(
    State(state): State<AppState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
) -> Result<Payload, ApiError> {
    let suffix = segment.strip_prefix("persons").ok_or(ApiError::NotFound)?;
    let accept = accept_header(&headers);
    let format = negotiate(Some(suffix), accept.as_deref())?;

    let set = state.query(Query::ListAll).await?;
    Ok(render(format, &set, Shape::Collection)?)
}

/// All `Accept` lines joined into one list, as if sent comma-separated.
///
/// Values that are not visible ASCII are skipped.
fn accept_header(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    (!values.is_empty()).then(|| values.join(", "))
}

/// `GET /persons/{id}{ext}`: one person plus enrichment fields.
pub async fn person_detail(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Payload, ApiError> {
    let (id, format) = strip_format_suffix(&segment).ok_or(ApiError::NotFound)?;
    let id: i64 = id.parse().map_err(|_| ApiError::NotFound)?;

    let mut set = state.query(Query::ById(id)).await?;
    let person = set.first().ok_or(ApiError::NotFound)?;
    let address = person
        .get("address")
        .and_then(Value::as_text)
        .map(str::to_owned);
    let birth_date = person
        .get("birth_date")
        .and_then(Value::as_timestamp)
        .map(|ts| ts.date_naive());

    let enrichment = &state.enrichment;
    let (coordinates, date_fact) = tokio::join!(
        async {
            match &address {
                Some(address) => enrichment.geocode(address).await,
                None => None,
            }
        },
        async {
            match birth_date {
                Some(date) => enrichment.date_fact(date).await,
                None => None,
            }
        },
    );

    tracing::debug!(
        person_id = id,
        geocoded = coordinates.is_some(),
        date_fact = date_fact.is_some(),
        "Detail enriched"
    );

    set.append_field("Latitude", |_| Value::from(coordinates.map(|c| c.latitude)));
    set.append_field("Longitude", |_| Value::from(coordinates.map(|c| c.longitude)));
    set.append_field("DateFact", |_| Value::from(date_fact.clone()));

    Ok(render(format, &set, Shape::Single)?)
}

/// `GET /persons/by-address/{substring}{ext}`.
pub async fn search_by_address(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Payload, ApiError> {
    search(&state, &segment, Query::AddressContains).await
}

/// `GET /persons/by-name/{substring}{ext}`.
pub async fn search_by_name(
    State(state): State<AppState>,
    Path(segment): Path<String>,
) -> Result<Payload, ApiError> {
    search(&state, &segment, Query::NameContains).await
}

async fn search(
    state: &AppState,
    segment: &str,
    query: fn(String) -> Query,
) -> Result<Payload, ApiError> {
    let (needle, format) = strip_format_suffix(segment).ok_or(ApiError::NotFound)?;
    let set = state.query(query(needle.to_string())).await?;
    Ok(render(format, &set, Shape::Collection)?)
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
