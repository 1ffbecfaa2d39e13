//! Request dispatcher.
//!
//! Ensures the database connection exists before any gated route runs, then
//! hands the request (with the connection handle in its extensions) to the
//! routing object. A connection failure becomes the uniform 500 envelope and
//! is never retried within the same request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::db::{ConnectionCache, Connector};
use crate::http::error::ApiError;

/// Middleware gating routes on an established connection.
///
/// Downstream handlers read the handle with `Extension<C::Handle>`.
pub async fn dispatch<C: Connector>(
    State(cache): State<Arc<ConnectionCache<C>>>,
    mut request: Request,
    next: Next,
) -> Response {
    match cache.ensure_connected().await {
        Ok(handle) => {
            request.extensions_mut().insert(handle);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(
                path = %request.uri().path(),
                error = %e,
                "Rejecting request, database unavailable"
            );
            ApiError::Connection(e).into_response()
        }
    }
}
