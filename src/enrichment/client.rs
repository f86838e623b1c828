//! HTTP enrichment client with timeout and error handling.
//!
//! # Responsibilities
//! - Geocode an address through a Nominatim-compatible search API
//! - Fetch a "what happened on this date" fact from a numbersapi-compatible API
//! - Bound every call with a timeout
//! - Degrade timeouts, transport errors, bad statuses and bad payloads to `None`

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::config::EnrichmentConfig;
use crate::enrichment::{city_of, Coordinates, EnrichmentClient, EnrichmentError};
use crate::observability::metrics;

/// Enrichment client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpEnrichmentClient {
    http: reqwest::Client,
    geocoder_url: Url,
    country: String,
    trivia_url: Url,
    timeout_duration: Duration,
}

/// One geocoder hit. Nominatim sends coordinates as strings.
#[derive(Debug, Deserialize)]
struct Place {
    lat: Degrees,
    lon: Degrees,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Number(f64),
    Text(String),
}

impl Degrees {
    fn value(&self) -> Option<f64> {
        let value = match self {
            Degrees::Number(n) => *n,
            Degrees::Text(s) => s.trim().parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Deserialize)]
struct DateFact {
    text: String,
    #[serde(default = "default_found")]
    found: bool,
}

fn default_found() -> bool {
    true
}

impl HttpEnrichmentClient {
    /// Create a new enrichment client.
    pub fn new(config: &EnrichmentConfig) -> Result<Self, EnrichmentError> {
        let timeout_duration = Duration::from_millis(config.timeout_ms);
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(timeout_duration)
            .build()?;

        let client = Self {
            http,
            geocoder_url: parse_url(&config.geocoder_url)?,
            country: config.country.clone(),
            trivia_url: parse_url(&config.trivia_url)?,
            timeout_duration,
        };

        tracing::info!(
            geocoder = %client.geocoder_url,
            trivia = %client.trivia_url,
            timeout_ms = config.timeout_ms,
            "Enrichment client initialized"
        );
        Ok(client)
    }

    /// Look up coordinates for the city part of `address`.
    pub async fn lookup_coordinates(
        &self,
        address: &str,
    ) -> Result<Option<Coordinates>, EnrichmentError> {
        let city = city_of(address);
        if city.is_empty() {
            return Ok(None);
        }

        let body = self
            .http
            .get(self.geocoder_url.clone())
            .query(&[
                ("format", "json"),
                ("country", self.country.as_str()),
                ("city", city.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        parse_places(&body)
    }

    /// Look up a historical fact for the month and day of `date`.
    pub async fn lookup_date_fact(&self, date: NaiveDate) -> Result<Option<String>, EnrichmentError> {
        let mut url = self.trivia_url.clone();
        url.path_segments_mut()
            .map_err(|_| EnrichmentError::InvalidUrl(self.trivia_url.to_string()))?
            .pop_if_empty()
            .push(&date.month().to_string())
            .push(&date.day().to_string())
            .push("date");
        url.set_query(Some("json"));

        let body = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        parse_date_fact(&body)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, EnrichmentError>
    where
        F: Future<Output = Result<T, EnrichmentError>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result,
            Err(_) => Err(EnrichmentError::Timeout(self.timeout_duration.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl EnrichmentClient for HttpEnrichmentClient {
    async fn geocode(&self, address: &str) -> Option<Coordinates> {
        let result = self.bounded(self.lookup_coordinates(address)).await;
        settle("geocode", result)
    }

    async fn date_fact(&self, date: NaiveDate) -> Option<String> {
        let result = self.bounded(self.lookup_date_fact(date)).await;
        settle("date_fact", result)
    }
}

fn settle<T>(lookup: &'static str, result: Result<Option<T>, EnrichmentError>) -> Option<T> {
    match result {
        Ok(Some(value)) => {
            metrics::record_enrichment(lookup, "hit");
            Some(value)
        }
        Ok(None) => {
            metrics::record_enrichment(lookup, "miss");
            None
        }
        Err(e) => {
            tracing::warn!(lookup, error = %e, "Enrichment lookup failed, continuing without it");
            metrics::record_enrichment(lookup, "error");
            None
        }
    }
}

fn parse_url(value: &str) -> Result<Url, EnrichmentError> {
    Url::parse(value).map_err(|e| EnrichmentError::InvalidUrl(format!("{}: {}", value, e)))
}

fn parse_places(body: &[u8]) -> Result<Option<Coordinates>, EnrichmentError> {
    let places: Vec<Place> =
        serde_json::from_slice(body).map_err(|e| EnrichmentError::Malformed(e.to_string()))?;
    let Some(place) = places.first() else {
        return Ok(None);
    };

    match (place.lat.value(), place.lon.value()) {
        (Some(latitude), Some(longitude)) => Ok(Some(Coordinates { latitude, longitude })),
        _ => Err(EnrichmentError::Malformed(
            "coordinates are not numbers".to_string(),
        )),
    }
}

fn parse_date_fact(body: &[u8]) -> Result<Option<String>, EnrichmentError> {
    let fact: DateFact =
        serde_json::from_slice(body).map_err(|e| EnrichmentError::Malformed(e.to_string()))?;
    Ok(fact.found.then_some(fact.text))
}
