//! MongoDB connector.
//!
//! # Responsibilities
//! - Parse the configured connection string
//! - Apply timeouts and pool limits suited to short-lived processes
//! - Verify the session with a `ping` before handing out a handle
//! - Track liveness from driver heartbeat events (no I/O on the hot path)
//!
//! A handle is dead once the topology closes or every known server is
//! failing its heartbeat. One failing replica-set member does not count.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::event::sdam::SdamEvent;
use mongodb::event::EventHandler;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::db::connector::{ConnectionHandle, Connector};
use crate::db::types::{ConnectionError, ConnectionResult};

/// Database used when neither config nor URI names one.
pub const DEFAULT_DATABASE: &str = "chatty";

/// An established MongoDB client plus the selected database.
#[derive(Clone)]
pub struct MongoHandle {
    client: Client,
    database: Database,
    live: Arc<AtomicBool>,
}

impl MongoHandle {
    /// The underlying driver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The application database.
    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl ConnectionHandle for MongoHandle {
    fn is_live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for MongoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoHandle")
            .field("database", &self.database.name())
            .field("live", &self.is_live())
            .finish()
    }
}

/// What a monitoring event says about one server or the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Observation {
    Up(String),
    Down(String),
    Removed(String),
    Closed,
}

impl Observation {
    fn from_event(event: &SdamEvent) -> Option<Self> {
        match event {
            SdamEvent::ServerOpening(e) => Some(Self::Up(e.address.to_string())),
            SdamEvent::ServerHeartbeatSucceeded(e) => Some(Self::Up(e.server_address.to_string())),
            SdamEvent::ServerHeartbeatFailed(e) => Some(Self::Down(e.server_address.to_string())),
            SdamEvent::ServerClosed(e) => Some(Self::Removed(e.address.to_string())),
            SdamEvent::TopologyClosed(_) => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Per-server heartbeat bookkeeping. `failing` is always a subset of `known`.
#[derive(Debug, Default)]
struct Liveness {
    known: HashSet<String>,
    failing: HashSet<String>,
    closed: bool,
}

impl Liveness {
    fn observe(&mut self, observation: Observation) {
        match observation {
            Observation::Up(address) => {
                self.failing.remove(&address);
                self.known.insert(address);
            }
            Observation::Down(address) => {
                self.known.insert(address.clone());
                self.failing.insert(address);
            }
            Observation::Removed(address) => {
                self.known.remove(&address);
                self.failing.remove(&address);
            }
            Observation::Closed => self.closed = true,
        }
    }

    fn is_live(&self) -> bool {
        !self.closed && (self.known.is_empty() || self.failing.len() < self.known.len())
    }
}

/// Opens MongoDB connections from [`DatabaseConfig`].
#[derive(Debug, Clone)]
pub struct MongoConnector {
    config: DatabaseConfig,
}

impl MongoConnector {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }

    async fn client_options(&self, uri: &str, live: Arc<AtomicBool>) -> ConnectionResult<ClientOptions> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| ConnectionError::InvalidUri(e.to_string()))?;

        let timeout = Duration::from_millis(self.config.connect_timeout_ms);
        options.app_name = Some(self.config.app_name.clone());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options.max_pool_size = Some(self.config.max_pool_size);
        let servers = Mutex::new(Liveness::default());
        options.sdam_event_handler = Some(EventHandler::callback(move |event: SdamEvent| {
            let Some(observation) = Observation::from_event(&event) else {
                return;
            };
            let mut servers = servers.lock().unwrap_or_else(PoisonError::into_inner);
            servers.observe(observation);
            let now = servers.is_live();
            if live.swap(now, Ordering::Relaxed) && !now {
                tracing::warn!(
                    known = servers.known.len(),
                    closed = servers.closed,
                    "No usable database server, marking connection dead"
                );
            }
        }));

        Ok(options)
    }
}

#[async_trait]
impl Connector for MongoConnector {
    type Handle = MongoHandle;

    async fn connect(&self) -> ConnectionResult<MongoHandle> {
        let uri = self
            .config
            .uri
            .as_deref()
            .ok_or(ConnectionError::NotConfigured)?;

        let live = Arc::new(AtomicBool::new(true));
        let options = self.client_options(uri, live.clone()).await?;
        let client = Client::with_options(options).map_err(|e| ConnectionError::Transport(e.to_string()))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;

        let database = match &self.config.name {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };

        tracing::debug!(database = %database.name(), "MongoDB session verified");

        Ok(MongoHandle {
            client,
            database,
            live,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn up(address: &str) -> Observation {
        Observation::Up(address.to_string())
    }

    fn down(address: &str) -> Observation {
        Observation::Down(address.to_string())
    }

    #[test]
    fn test_one_failing_member_keeps_handle_live() {
        let mut servers = Liveness::default();
        for address in ["a:27017", "b:27017", "c:27017"] {
            servers.observe(up(address));
        }

        servers.observe(down("b:27017"));
        assert!(servers.is_live());

        servers.observe(down("c:27017"));
        assert!(servers.is_live());

        servers.observe(down("a:27017"));
        assert!(!servers.is_live());

        servers.observe(up("c:27017"));
        assert!(servers.is_live());
    }

    #[test]
    fn test_removed_server_no_longer_counts() {
        let mut servers = Liveness::default();
        servers.observe(up("a:27017"));
        servers.observe(down("b:27017"));
        assert!(servers.is_live());

        servers.observe(Observation::Removed("a:27017".to_string()));
        assert!(!servers.is_live());

        servers.observe(Observation::Removed("b:27017".to_string()));
        assert!(servers.is_live(), "nothing known yet");
    }

    #[test]
    fn test_topology_close_is_final() {
        let mut servers = Liveness::default();
        servers.observe(up("a:27017"));
        servers.observe(Observation::Closed);
        assert!(!servers.is_live());

        servers.observe(up("a:27017"));
        assert!(!servers.is_live());
    }

    #[tokio::test]
    async fn test_missing_uri_is_not_configured() {
        let connector = MongoConnector::new(DatabaseConfig::default());
        let err = connector.connect().await.unwrap_err();
        assert_eq!(err, ConnectionError::NotConfigured);
    }

    #[tokio::test]
    async fn test_malformed_uri_is_rejected() {
        let config = DatabaseConfig {
            uri: Some("mongodb://".into()),
            ..DatabaseConfig::default()
        };
        let err = MongoConnector::new(config).connect().await.unwrap_err();
        assert!(matches!(err, ConnectionError::InvalidUri(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_within_timeout() {
        // Nothing listens on port 1; server selection gives up after the bound.
        let config = DatabaseConfig {
            uri: Some("mongodb://127.0.0.1:1/?directConnection=true".into()),
            connect_timeout_ms: 300,
            ..DatabaseConfig::default()
        };
        let started = std::time::Instant::now();
        let err = MongoConnector::new(config).connect().await.unwrap_err();

        assert!(matches!(err, ConnectionError::Transport(_)), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
