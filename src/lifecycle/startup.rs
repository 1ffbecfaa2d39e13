//! Startup orchestration.
//!
//! Load `.env` → load and validate config → logging → build the connection
//! cache and server → run in the selected hosting mode. Any startup error is
//! fatal; a missing or unreachable database is not (it surfaces per request).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, AppConfig, ConfigError};
use crate::db::{ConnectionCache, Connector, MongoConnector};
use crate::http::{HttpServer, RouteGroups};
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::forward_signals;
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("lambda runtime error: {0}")]
    Lambda(String),
}

/// Load environment and configuration, then install logging.
pub fn prepare(config_path: Option<&Path>) -> Result<AppConfig, StartupError> {
    let dotenv = dotenvy::dotenv();
    let config = load_config(config_path)?;
    logging::init_logging(&config)?;

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
    }

    tracing::info!(
        environment = config.environment.as_str(),
        database_configured = config.database.uri.is_some(),
        cors_origin = config.cors.client_url.as_deref().unwrap_or("*"),
        max_body_size = config.security.max_body_size,
        "Configuration loaded"
    );

    Ok(config)
}

/// Wire the MongoDB connection cache into a server. Nothing is dialed yet.
pub fn build_server(config: AppConfig, routes: RouteGroups) -> HttpServer<MongoConnector> {
    let timeout = Duration::from_millis(config.database.connect_timeout_ms);
    let cache = Arc::new(ConnectionCache::new(
        MongoConnector::new(config.database.clone()),
        timeout,
    ));
    HttpServer::new(config, cache, routes)
}

/// Run as a long-lived local server until SIGINT/SIGTERM.
pub async fn serve<C: Connector>(server: HttpServer<C>, bind_override: Option<String>) -> Result<(), StartupError> {
    let observability = &server.config().observability;
    if observability.metrics_enabled {
        match observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = bind_override.unwrap_or_else(|| server.config().listener.bind_address.clone());
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        forward_signals(&shutdown).await;
    });

    server.run(listener, server_shutdown).await.map_err(StartupError::Serve)
}

/// Run under the Lambda HTTP runtime.
pub async fn lambda<C: Connector>(server: HttpServer<C>) -> Result<(), StartupError> {
    server
        .run_lambda()
        .await
        .map_err(|e| StartupError::Lambda(e.to_string()))
}
