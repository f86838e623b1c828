//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, metrics)
//! - Build the record source and enrichment client from config
//! - Bind server to listener and shut down gracefully

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::get,
    Router,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, ServiceConfig};
use crate::enrichment::{DisabledEnrichment, EnrichmentClient, EnrichmentError, HttpEnrichmentClient};
use crate::http::handlers::{list_persons, not_found, person_detail, search_by_address, search_by_name};
use crate::http::request::{request_id_of, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::ApiError;
use crate::lifecycle::shutdown;
use crate::observability::metrics::track_requests;
use crate::records::{normalize, ResultSet};
use crate::store::{Query, RecordSource, SqliteRecordSource};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("enrichment client: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn RecordSource>,
    pub enrichment: Arc<dyn EnrichmentClient>,
}

impl AppState {
    pub fn new(source: Arc<dyn RecordSource>, enrichment: Arc<dyn EnrichmentClient>) -> Self {
        Self { source, enrichment }
    }

    /// Run `query` on the blocking pool and normalize its rows.
    pub async fn query(&self, query: Query) -> Result<ResultSet, ApiError> {
        let schema = query.schema();
        let label = query.label();
        let source = Arc::clone(&self.source);

        let rows = tokio::task::spawn_blocking(move || source.fetch(&query)).await??;
        let set = normalize(rows, schema)?;

        tracing::debug!(query = label, records = set.len(), "Result set ready");
        Ok(set)
    }
}

/// HTTP server for the persons API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server around already-built collaborators.
    pub fn new(config: ServiceConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(&config, state),
        }
    }

    /// Create a server with the SQLite source and the configured enrichment client.
    pub fn from_config(config: ServiceConfig) -> Result<Self, StartupError> {
        if !Path::new(&config.database.path).exists() {
            tracing::warn!(
                path = %config.database.path,
                "Database file not found; queries will fail until it exists"
            );
        }
        let source: Arc<dyn RecordSource> = Arc::new(SqliteRecordSource::new(&config.database));

        let enrichment: Arc<dyn EnrichmentClient> = if config.enrichment.enabled {
            Arc::new(HttpEnrichmentClient::new(&config.enrichment)?)
        } else {
            tracing::info!("Enrichment disabled");
            Arc::new(DisabledEnrichment)
        };

        Ok(Self::new(config, AppState::new(source, enrichment)))
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServiceConfig, state: AppState) -> Router {
        Router::new()
            .route("/{listing}", get(list_persons))
            .route("/persons/{item}", get(person_detail))
            .route("/persons/by-address/{query}", get(search_by_address))
            .route("/persons/by-name/{query}", get(search_by_name))
            .route_layer(middleware::from_fn(track_requests))
            .fallback(not_found)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            request_id = %request_id_of(request),
                            method = %request.method(),
                            path = %request.uri().path(),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown_rx` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
