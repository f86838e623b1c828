//! Persons read API.
//!
//! Serves a `persons` table as JSON, XML or CSV, chosen by URL suffix or
//! `Accept` header, and enriches single-person lookups with geocoding and
//! date trivia from third-party APIs.
//!
//! ```text
//! request → http::handlers → store (query) → records (normalize)
//!         → [enrichment] → render::negotiate → render (encode) → response
//! ```

// Core pipeline
pub mod records;
pub mod render;
pub mod store;

// Collaborators and glue
pub mod config;
pub mod enrichment;
pub mod http;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
