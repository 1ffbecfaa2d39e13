//! Built-in API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::{ConnectionCache, Connector};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub message: String,
    pub mongodb: DbState,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DbState {
    Connected,
    Disconnected,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// `GET /api/health`: always 200, reports the cached connection state
/// without dialing the database.
pub async fn health<C: Connector>(State(cache): State<Arc<ConnectionCache<C>>>) -> Json<HealthStatus> {
    let mongodb = if cache.is_connected() {
        DbState::Connected
    } else {
        DbState::Disconnected
    };

    Json(HealthStatus {
        status: "ok".to_string(),
        message: "API is running".to_string(),
        mongodb,
    })
}

/// `GET /api`
pub async fn root() -> Json<MessageBody> {
    Json(MessageBody::new("Chatty API"))
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(MessageBody::new("Not found")))
}
