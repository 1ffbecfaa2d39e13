//! Shared utilities for integration testing.

use async_trait::async_trait;
use axum::{routing::get, Extension, Router};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chatty_api::config::AppConfig;
use chatty_api::db::{ConnectionCache, ConnectionError, ConnectionHandle, ConnectionResult, Connector};
use chatty_api::http::{HttpServer, RouteGroups};
use chatty_api::lifecycle::Shutdown;

/// Handle produced by [`ScriptedDb`]; `id` is the attempt that created it.
#[derive(Clone, Debug)]
pub struct FakeHandle {
    pub id: u64,
    pub live: Arc<AtomicBool>,
}

impl ConnectionHandle for FakeHandle {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }
}

/// A database stand-in with adjustable latency and reachability.
#[derive(Clone)]
pub struct ScriptedDb {
    pub attempts: Arc<AtomicU64>,
    pub reachable: Arc<AtomicBool>,
    pub latency: Duration,
}

impl ScriptedDb {
    pub fn new(latency: Duration, reachable: bool) -> Self {
        Self {
            attempts: Arc::new(AtomicU64::new(0)),
            reachable: Arc::new(AtomicBool::new(reachable)),
            latency,
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connector for ScriptedDb {
    type Handle = FakeHandle;

    async fn connect(&self) -> ConnectionResult<FakeHandle> {
        let id = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.latency).await;
        if self.reachable.load(Ordering::SeqCst) {
            Ok(FakeHandle {
                id,
                live: Arc::new(AtomicBool::new(true)),
            })
        } else {
            Err(ConnectionError::Transport("connection refused".into()))
        }
    }
}

/// Messaging group that reports which connection served it.
pub fn messages_routes() -> Router {
    Router::new().route(
        "/connection",
        get(|Extension(handle): Extension<FakeHandle>| async move { handle.id.to_string() }),
    )
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub cache: Arc<ConnectionCache<ScriptedDb>>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the real server on an ephemeral port.
pub async fn start_server(config: AppConfig, db: ScriptedDb, connect_timeout: Duration) -> TestServer {
    let cache = Arc::new(ConnectionCache::new(db, connect_timeout));
    let server = HttpServer::new(
        config,
        cache.clone(),
        RouteGroups::new().with_messages(messages_routes()),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        cache,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
