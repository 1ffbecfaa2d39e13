//! Cross-origin policy.
//!
//! A configured `client_url` is the only allowed origin; without one any
//! origin is mirrored back. Credentials (cookies) are always allowed, which
//! rules out the `*` wildcard.

use axum::http::{HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use crate::config::CorsConfig;

pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = match config.client_url.as_deref() {
        Some(url) => match HeaderValue::from_str(url.trim_end_matches('/')) {
            Ok(origin) => AllowOrigin::exact(origin),
            Err(e) => {
                tracing::warn!(client_url = %url, error = %e, "Unusable CLIENT_URL, mirroring request origin");
                AllowOrigin::mirror_request()
            }
        },
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request())
}
