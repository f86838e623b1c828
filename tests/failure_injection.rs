//! Failure injection tests for the enrichment lookups.
//!
//! Every upstream failure must leave the detail response intact, with the
//! enrichment fields set to null.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use persons_api::http::HttpServer;
use persons_api::lifecycle::Shutdown;

mod common;

/// Spawn the API on an ephemeral port, geocoder and trivia both served by `upstream`.
async fn start_api(db: &std::path::Path, upstream: SocketAddr, timeout_ms: u64) -> (SocketAddr, Shutdown) {
    let mut config = common::test_config(db);
    config.enrichment.enabled = true;
    config.enrichment.timeout_ms = timeout_ms;
    config.enrichment.geocoder_url = format!("http://{}/search", upstream);
    config.enrichment.trivia_url = format!("http://{}/trivia", upstream);

    let server = HttpServer::from_config(config).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

async fn fetch_detail(api: SocketAddr, id: i64) -> (u16, serde_json::Value) {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let res = client
        .get(format!("http://{}/persons/{}.json", api, id))
        .send()
        .await
        .expect("API unreachable");
    let status = res.status().as_u16();
    (status, res.json().await.unwrap())
}

fn assert_unenriched(body: &serde_json::Value) {
    assert_eq!(body["name"], "Anna");
    assert!(body["Latitude"].is_null(), "{}", body);
    assert!(body["Longitude"].is_null(), "{}", body);
    assert!(body["DateFact"].is_null(), "{}", body);
}

#[tokio::test]
async fn test_successful_enrichment() {
    let dir = tempfile::tempdir().unwrap();
    let db = common::seed_database(dir.path());

    let heads = Arc::new(Mutex::new(Vec::new()));
    let seen = heads.clone();
    let upstream = common::start_programmable_backend(move |head: String| {
        seen.lock().unwrap().push(head.clone());
        async move {
            if head.contains("/search") {
                (200, r#"[{"lat":"47.4979","lon":"19.0402"}]"#.to_string())
            } else {
                (200, r#"{"text":"May 17th is a day.","found":true}"#.to_string())
            }
        }
    })
    .await;

    let (api, shutdown) = start_api(&db, upstream, 2000).await;
    let (status, body) = fetch_detail(api, 1).await;

    assert_eq!(status, 200);
    assert_eq!(body["Latitude"], 47.4979);
    assert_eq!(body["Longitude"], 19.0402);
    assert_eq!(body["DateFact"], "May 17th is a day.");

    let heads = heads.lock().unwrap();
    assert!(heads
        .iter()
        .any(|h| h.contains("city=Budapest") && h.contains("country=Hungary")));
    assert!(heads.iter().any(|h| h.contains("/trivia/5/17/date?json")));
    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let db = common::seed_database(dir.path());

    let upstream = common::start_programmable_backend(|_| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, "[]".to_string())
    })
    .await;

    let (api, shutdown) = start_api(&db, upstream, 200).await;
    let started = Instant::now();
    let (status, body) = fetch_detail(api, 1).await;

    assert_eq!(status, 200);
    assert_unenriched(&body);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "lookups were not bounded: {:?}",
        started.elapsed()
    );
    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = common::seed_database(dir.path());

    let upstream =
        common::start_programmable_backend(|_| async { (500, "boom".to_string()) }).await;

    let (api, shutdown) = start_api(&db, upstream, 2000).await;
    let (status, body) = fetch_detail(api, 1).await;

    assert_eq!(status, 200);
    assert_unenriched(&body);
    assert_eq!(body["birth_date"], "1990-05-17T00:00:00Z");
    shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_upstream_payload() {
    let dir = tempfile::tempdir().unwrap();
    let db = common::seed_database(dir.path());

    let upstream = common::start_programmable_backend(|head: String| async move {
        if head.contains("/search") {
            (200, r#"[{"lat":"north","lon":"east"}]"#.to_string())
        } else {
            (200, "<html>not json</html>".to_string())
        }
    })
    .await;

    let (api, shutdown) = start_api(&db, upstream, 2000).await;
    let (status, body) = fetch_detail(api, 1).await;

    assert_eq!(status, 200);
    assert_unenriched(&body);
    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let db = common::seed_database(dir.path());
    let upstream = common::closed_port().await;

    let (api, shutdown) = start_api(&db, upstream, 2000).await;
    let (status, body) = fetch_detail(api, 1).await;

    assert_eq!(status, 200);
    assert_unenriched(&body);
    shutdown.trigger();
}

#[tokio::test]
async fn test_geocoder_without_results() {
    let dir = tempfile::tempdir().unwrap();
    let db = common::seed_database(dir.path());

    let upstream = common::start_programmable_backend(|head: String| async move {
        if head.contains("/search") {
            (200, "[]".to_string())
        } else {
            (200, r#"{"text":"Nothing known.","found":false}"#.to_string())
        }
    })
    .await;

    let (api, shutdown) = start_api(&db, upstream, 2000).await;
    let (status, body) = fetch_detail(api, 1).await;

    assert_eq!(status, 200);
    assert_unenriched(&body);
    shutdown.trigger();
}
