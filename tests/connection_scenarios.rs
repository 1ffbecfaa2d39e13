//! End-to-end connection caching scenarios against a running server.

use chatty_api::config::AppConfig;
use chatty_api::db::ConnectionStatus;
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

mod common;

use common::{client, start_server, ScriptedDb};

#[tokio::test]
async fn test_concurrent_cold_invocations_share_one_connection() {
    let db = ScriptedDb::new(Duration::from_millis(300), true);
    let server = start_server(AppConfig::default(), db.clone(), Duration::from_secs(5)).await;
    let client = client();

    let url = server.url("/api/messages/connection");
    let (a, b) = tokio::join!(client.get(&url).send(), client.get(&url).send());
    let a = a.expect("server unreachable");
    let b = b.expect("server unreachable");

    assert_eq!(a.status(), 200);
    assert_eq!(b.status(), 200);
    assert_eq!(a.text().await.unwrap(), "1");
    assert_eq!(b.text().await.unwrap(), "1");
    assert_eq!(db.attempts(), 1, "exactly one connection attempt");

    // Warm invocations reuse the handle.
    for _ in 0..5 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.text().await.unwrap(), "1");
    }
    assert_eq!(db.attempts(), 1);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_database_yields_error_envelope() {
    let db = ScriptedDb::new(Duration::from_millis(10), false);
    let server = start_server(AppConfig::default(), db.clone(), Duration::from_secs(2)).await;
    let client = client();

    let res = client.get(server.url("/api/messages/connection")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Internal server error");
    assert_eq!(body["error"], "database connection failed: connection refused");

    assert_eq!(server.cache.status(), ConnectionStatus::Failed);
    assert_eq!(db.attempts(), 1, "no retry within the invocation");

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_slow_database_times_out() {
    let db = ScriptedDb::new(Duration::from_secs(10), true);
    let server = start_server(AppConfig::default(), db.clone(), Duration::from_millis(200)).await;
    let client = client();

    let started = Instant::now();
    let res = client.get(server.url("/api")).send().await.unwrap();
    assert_eq!(res.status(), 500);
    assert!(started.elapsed() < Duration::from_secs(5));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "database connection timed out after 200ms");
    assert_eq!(server.cache.status(), ConnectionStatus::Failed);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_next_invocation_retries_after_failure() {
    let db = ScriptedDb::new(Duration::from_millis(10), false);
    let server = start_server(AppConfig::default(), db.clone(), Duration::from_secs(2)).await;
    let client = client();
    let url = server.url("/api/messages/connection");

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 500);

    db.reachable.store(true, Ordering::SeqCst);
    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "2");
    assert_eq!(server.cache.status(), ConnectionStatus::Connected);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_dead_handle_is_replaced() {
    let db = ScriptedDb::new(Duration::from_millis(10), true);
    let server = start_server(AppConfig::default(), db.clone(), Duration::from_secs(2)).await;
    let client = client();
    let url = server.url("/api/messages/connection");

    assert_eq!(client.get(&url).send().await.unwrap().text().await.unwrap(), "1");

    let handle = server.cache.handle().expect("connected");
    handle.live.store(false, Ordering::SeqCst);

    assert_eq!(client.get(&url).send().await.unwrap().text().await.unwrap(), "2");
    assert_eq!(db.attempts(), 2);

    server.shutdown.trigger();
}

#[tokio::test]
async fn test_health_tracks_state_without_connecting() {
    let db = ScriptedDb::new(Duration::from_millis(10), false);
    let server = start_server(AppConfig::default(), db.clone(), Duration::from_secs(2)).await;
    let client = client();

    let health: Value = client.get(server.url("/api/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["mongodb"], "disconnected");
    assert_eq!(db.attempts(), 0);

    // A failed gated request leaves health at 200 / disconnected.
    let _ = client.get(server.url("/api")).send().await.unwrap();
    let res = client.get(server.url("/api/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let health: Value = res.json().await.unwrap();
    assert_eq!(health["mongodb"], "disconnected");

    db.reachable.store(true, Ordering::SeqCst);
    let _ = client.get(server.url("/api")).send().await.unwrap();
    let health: Value = client.get(server.url("/api/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(health["mongodb"], "connected");

    server.shutdown.trigger();
}
