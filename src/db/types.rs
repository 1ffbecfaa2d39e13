//! Connection state types and error definitions.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while establishing the database connection.
///
/// `Clone` so a single attempt's outcome can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// No connection string was configured.
    #[error("database URI is not configured")]
    NotConfigured,

    /// The connection string could not be parsed.
    #[error("invalid database URI: {0}")]
    InvalidUri(String),

    /// Transport or authentication failure reported by the driver.
    #[error("database connection failed: {0}")]
    Transport(String),

    /// The attempt did not finish within the configured bound.
    #[error("database connection timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl ConnectionError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectionError::NotConfigured => "not_configured",
            ConnectionError::InvalidUri(_) => "invalid_uri",
            ConnectionError::Transport(_) => "transport",
            ConnectionError::Timeout(_) => "timeout",
        }
    }
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Lifecycle status of the cached connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Unconnected,
    Connecting,
    Connected,
    Failed,
}

/// Point-in-time view of the connection cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    pub last_error: Option<ConnectionError>,
    /// Total connection attempts started by this cache.
    pub attempts: u64,
}
