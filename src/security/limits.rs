//! Request body limits.
//!
//! `RequestBodyLimitLayer` rejects bodies whose declared length is over the
//! cap with 413 before anything else runs. Streamed bodies without a declared
//! length are buffered by [`buffer_undeclared_body`] ahead of the dispatcher,
//! so an oversized chunked upload is a 413 and never dials the database.
//! `DefaultBodyLimit` lifts axum's built-in 2MB extractor cap to the
//! configured size.

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{DefaultBodyLimit, FromRequest, Request},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::limit::RequestBodyLimitLayer;

pub const DEFAULT_MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

pub fn request_body_limit(max: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(max)
}

pub fn extractor_body_limit(max: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max)
}

/// Read a body of unknown length into memory, up to the extractor limit.
///
/// Requests with a `content-length` or a known-empty body pass through
/// untouched.
pub async fn buffer_undeclared_body(request: Request, next: Next) -> Response {
    if request.headers().contains_key(CONTENT_LENGTH) || request.body().size_hint().exact() == Some(0) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let request = Request::from_parts(parts.clone(), body);
    match Bytes::from_request(request, &()).await {
        Ok(bytes) => next.run(Request::from_parts(parts, Body::from(bytes))).await,
        Err(rejection) => {
            tracing::warn!(
                path = %parts.uri.path(),
                status = %rejection.status(),
                "Rejecting streamed request body"
            );
            rejection.into_response()
        }
    }
}
