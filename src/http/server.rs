//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router: built-in routes plus delegated route groups
//! - Gate every route except health behind the dispatcher
//! - Wire up middleware (tracing, request ID, CORS, limits, timeout, errors)
//! - Serve on a TCP listener, or hand the router to the Lambda runtime

use axum::{middleware, routing::get, Router};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::db::{ConnectionCache, Connector};
use crate::http::dispatch::dispatch;
use crate::http::error::{panic_response, render_errors, ErrorPolicy};
use crate::http::handlers;
use crate::http::routes::RouteGroups;
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;
use crate::observability::tracing::{RequestSpan, UuidRequestId};
use crate::security::cors::cors_layer;
use crate::security::limits::{buffer_undeclared_body, extractor_body_limit, request_body_limit};

/// HTTP front of the API.
pub struct HttpServer<C: Connector> {
    router: Router,
    config: AppConfig,
    _connector: PhantomData<C>,
}

impl<C: Connector> HttpServer<C> {
    /// Create a new HTTP server around an externally owned connection cache.
    pub fn new(config: AppConfig, cache: Arc<ConnectionCache<C>>, routes: RouteGroups) -> Self {
        let router = Self::build_router(&config, cache, routes);
        Self {
            router,
            config,
            _connector: PhantomData,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, cache: Arc<ConnectionCache<C>>, routes: RouteGroups) -> Router {
        let gated = routes
            .mount(Router::new().route("/api", get(handlers::root)))
            .route_layer(middleware::from_fn_with_state(cache.clone(), dispatch::<C>))
            .route_layer(middleware::from_fn(buffer_undeclared_body));

        let health: Router = Router::new()
            .route("/api/health", get(handlers::health::<C>))
            .with_state(cache);

        let policy = ErrorPolicy {
            expose_details: config.expose_error_details(),
        };
        let max_body = config.security.max_body_size;

        health
            .merge(gated)
            .fallback(handlers::not_found)
            .layer(extractor_body_limit(max_body))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(middleware::from_fn_with_state(policy, render_errors))
            .layer(request_body_limit(max_body))
            .layer(cors_layer(&config.cors))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(metrics::track_requests))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = self.config.environment.as_str(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve invocations from the Lambda HTTP runtime. The connection cache
    /// lives as long as the warm process does.
    pub async fn run_lambda(self) -> Result<(), lambda_http::Error> {
        tracing::info!(
            environment = self.config.environment.as_str(),
            "Lambda handler starting"
        );
        lambda_http::run(self.router).await
    }

    /// A clone of the assembled router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
