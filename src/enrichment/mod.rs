//! Best-effort enrichment from third-party HTTP APIs.
//!
//! # Data Flow
//! ```text
//! detail handler
//!     → geocode(address)      ─┐ concurrently
//!     → date_fact(birth_date) ─┘
//!     → Option<_> each; None becomes a null field
//! ```
//!
//! # Design Decisions
//! - The trait is infallible by signature: failures end at this boundary
//! - Every upstream call has a deadline
//! - Failures are logged and counted, never returned to the caller

pub mod client;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

pub use client::HttpEnrichmentClient;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Why an upstream lookup produced nothing.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("upstream timeout after {0} ms")]
    Timeout(u64),

    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected upstream payload: {0}")]
    Malformed(String),

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),
}

/// Lookups that may add optional data to a record.
#[async_trait]
pub trait EnrichmentClient: Send + Sync {
    async fn geocode(&self, address: &str) -> Option<Coordinates>;

    async fn date_fact(&self, date: NaiveDate) -> Option<String>;
}

/// Client used when enrichment is turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEnrichment;

#[async_trait]
impl EnrichmentClient for DisabledEnrichment {
    async fn geocode(&self, _address: &str) -> Option<Coordinates> {
        None
    }

    async fn date_fact(&self, _date: NaiveDate) -> Option<String> {
        None
    }
}

/// City name the geocoder is asked about.
///
/// Takes the address up to the first comma, then up to the first period,
/// and expands the `Bp` abbreviation.
pub fn city_of(address: &str) -> String {
    let head = address.split(',').next().unwrap_or_default();
    let head = head.split('.').next().unwrap_or_default();
    head.replace("Bp", "Budapest").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_of() {
        assert_eq!(city_of("Budapest, Fő utca 1."), "Budapest");
        assert_eq!(city_of("Bp. XI. Budafoki út 8."), "Budapest");
        assert_eq!(city_of("Pécs"), "Pécs");
        assert_eq!(city_of(" Szeged , Tisza Lajos krt. 2."), "Szeged");
        assert_eq!(city_of(""), "");
    }

    #[tokio::test]
    async fn test_disabled_client_returns_nothing() {
        let client = DisabledEnrichment;
        assert!(client.geocode("Budapest").await.is_none());
        let date = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();
        assert!(client.date_fact(date).await.is_none());
    }
}
