//! Structured logging.
//!
//! JSON output in production, pretty output elsewhere. `RUST_LOG` wins over
//! the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AppConfig, Environment, LogFormat};

/// Resolve the effective log format.
pub fn log_format(config: &AppConfig) -> LogFormat {
    config.observability.log_format.unwrap_or(match config.environment {
        Environment::Production => LogFormat::Json,
        _ => LogFormat::Pretty,
    })
}

/// Default filter directive when `RUST_LOG` is unset.
pub fn default_directive(config: &AppConfig) -> String {
    let level = &config.observability.log_level;
    format!("chatty_api={level},tower_http={level}")
}

/// Install the global subscriber.
pub fn init_logging(config: &AppConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let registry = tracing_subscriber::registry().with(filter);
    match log_format(config) {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
    }
}
