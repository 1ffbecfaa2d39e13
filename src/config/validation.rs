//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and formats and
//! returns every problem found, not just the first.

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("database.uri must start with mongodb:// or mongodb+srv://")]
    InvalidDatabaseScheme,

    #[error("cors.client_url is not an absolute http(s) URL: {0}")]
    InvalidClientUrl(String),
}

/// Validate a configuration, collecting all errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero { field: "security.max_body_size" });
    }
    if config.database.connect_timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "database.connect_timeout_ms" });
    }
    if config.database.max_pool_size == 0 {
        errors.push(ValidationError::Zero { field: "database.max_pool_size" });
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if let Some(uri) = &config.database.uri {
        if !(uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://")) {
            errors.push(ValidationError::InvalidDatabaseScheme);
        }
    }

    if let Some(client_url) = &config.cors.client_url {
        match Url::parse(client_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            _ => errors.push(ValidationError::InvalidClientUrl(client_url.clone())),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
