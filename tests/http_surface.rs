//! HTTP surface checks against a running server.

use chatty_api::config::{AppConfig, Environment};
use serde_json::Value;
use std::time::Duration;

mod common;

use common::{client, start_server, ScriptedDb};

#[tokio::test]
async fn test_root_route() {
    let db = ScriptedDb::new(Duration::ZERO, true);
    let server = start_server(AppConfig::default(), db, Duration::from_secs(1)).await;

    let res = client().get(server.url("/api")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "message": "Chatty API" }));

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_production_envelope_omits_detail() {
    let mut config = AppConfig::default();
    config.environment = Environment::Production;
    let db = ScriptedDb::new(Duration::ZERO, false);
    let server = start_server(config, db, Duration::from_secs(1)).await;

    let res = client().get(server.url("/api/messages/connection")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    assert_eq!(res.headers()["content-type"], "application/json");
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "message": "Internal server error" }));

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_cors_restricted_to_client_url() {
    let mut config = AppConfig::default();
    config.cors.client_url = Some("http://localhost:5173".into());
    let db = ScriptedDb::new(Duration::ZERO, true);
    let server = start_server(config, db, Duration::from_secs(1)).await;
    let client = client();

    let res = client
        .get(server.url("/api/health"))
        .header("origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["access-control-allow-origin"], "http://localhost:5173");
    assert_eq!(res.headers()["access-control-allow-credentials"], "true");

    let res = client
        .get(server.url("/api/health"))
        .header("origin", "http://elsewhere.test")
        .send()
        .await
        .unwrap();
    assert!(res.headers().get("access-control-allow-origin").is_none());

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_preflight_skips_dispatcher() {
    let db = ScriptedDb::new(Duration::ZERO, false);
    let server = start_server(AppConfig::default(), db.clone(), Duration::from_secs(1)).await;

    let res = client()
        .request(reqwest::Method::OPTIONS, server.url("/api/messages/connection"))
        .header("origin", "http://app.test")
        .header("access-control-request-method", "GET")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["access-control-allow-origin"], "http://app.test");
    assert_eq!(db.attempts(), 0);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let db = ScriptedDb::new(Duration::ZERO, false);
    let server = start_server(AppConfig::default(), db, Duration::from_secs(1)).await;
    let client = client();

    for path in ["/api/health", "/api", "/missing"] {
        let res = client.get(server.url(path)).send().await.unwrap();
        assert!(res.headers().contains_key("x-request-id"), "missing on {path}");
    }

    server.shutdown.trigger();
}
