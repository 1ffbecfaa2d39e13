//! Uniform error envelope.
//!
//! # Responsibilities
//! - Define the request-level error taxonomy
//! - Log full error detail, always
//! - Render every failure as 500 `{message, error}` with `error` only when
//!   details are exposed (non-production)
//!
//! Handlers and middleware return [`ApiError`]; its response carries the
//! detail in an extension, and [`render_errors`] turns that into the public
//! body. Panics are captured by [`panic_response`] and rendered the same way.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use thiserror::Error;

use crate::db::ConnectionError;
use crate::observability::{metrics, tracing::X_REQUEST_ID};

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Errors surfaced at the request boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The database could not be reached.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Anything raised by the routing object or its delegates.
    #[error("{0}")]
    Handler(String),
}

impl ApiError {
    /// Wrap an arbitrary handler failure.
    pub fn handler(err: impl std::fmt::Display) -> Self {
        ApiError::Handler(err.to_string())
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Connection(_) => "connection",
            ApiError::Handler(_) => "handler",
        }
    }
}

/// Full error detail, attached to a 500 response until rendered.
#[derive(Debug, Clone)]
pub struct ErrorDetail {
    pub kind: &'static str,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = ErrorDetail {
            kind: self.kind(),
            message: self.to_string(),
        };
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response.extensions_mut().insert(detail);
        response
    }
}

/// Public JSON body for failed requests.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Whether rendered errors include their detail.
#[derive(Debug, Clone, Copy)]
pub struct ErrorPolicy {
    pub expose_details: bool,
}

/// Middleware rewriting any response that carries an [`ErrorDetail`].
pub async fn render_errors(State(policy): State<ErrorPolicy>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = next.run(request).await;
    let Some(detail) = response.extensions().get::<ErrorDetail>().cloned() else {
        return response;
    };

    tracing::error!(
        request_id = %request_id,
        method = %method,
        path = %path,
        kind = detail.kind,
        error = %detail.message,
        "Request failed"
    );
    metrics::record_error(detail.kind);

    let (mut parts, _) = response.into_parts();
    parts.status = StatusCode::INTERNAL_SERVER_ERROR;
    parts.extensions.remove::<ErrorDetail>();
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);

    let body = ErrorBody {
        message: INTERNAL_ERROR_MESSAGE.to_string(),
        error: policy.expose_details.then_some(detail.message),
    };
    (parts, Json(body)).into_response()
}

/// Convert a caught panic into an [`ApiError::Handler`] response.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    ApiError::Handler(format!("handler panicked: {message}")).into_response()
}
