//! Persons read API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────────┐
//!                     │                   PERSONS API                      │
//!                     │                                                    │
//!   Client Request    │  ┌─────────┐   ┌──────────┐   ┌──────────────┐     │
//!   ──────────────────┼─▶│  http   │──▶│ handlers │──▶│ store        │◀────┼── SQLite
//!                     │  │ server  │   │          │   │ (query)      │     │
//!                     │  └─────────┘   └────┬─────┘   └──────┬───────┘     │
//!                     │                     │                ▼             │
//!                     │                     │         ┌──────────────┐     │
//!                     │                     │         │ records      │     │
//!                     │                     │         │ (normalize)  │     │
//!                     │                     │         └──────┬───────┘     │
//!                     │                     ▼                ▼             │
//!                     │              ┌────────────┐   ┌──────────────┐     │
//!                     │              │ enrichment │   │ render       │     │
//!   Client Response   │              │ (geocode,  │   │ negotiate +  │     │
//!   ◀─────────────────┼──────────────│  trivia)   │   │ json/xml/csv │     │
//!                     │              └────────────┘   └──────────────┘     │
//!                     └────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use persons_api::config::{load_config, ServiceConfig};
use persons_api::http::{HttpServer, StartupError};
use persons_api::lifecycle::{signals, Shutdown};
use persons_api::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "persons-api")]
#[command(about = "Read API over the persons table (JSON, XML, CSV)", long_about = None)]
struct Cli {
    /// Path to a TOML config file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "persons-api starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        database = %config.database.path,
        enrichment = config.enrichment.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::from_config(config)?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
