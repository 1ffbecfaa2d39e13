//! Metrics collection and exposition.
//!
//! # Metrics
//! - `chatty_requests_total` (counter): requests by method, status
//! - `chatty_request_duration_seconds` (histogram): latency distribution
//! - `chatty_db_connection_attempts_total` (counter): attempt outcomes
//! - `chatty_db_connected` (gauge): 1=connected, 0=not connected
//! - `chatty_errors_total` (counter): rendered 500s by kind

use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!("chatty_requests_total", "method" => method.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!("chatty_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_connection_attempt(outcome: &'static str) {
    counter!("chatty_db_connection_attempts_total", "outcome" => outcome).increment(1);
}

pub fn record_db_connected(connected: bool) {
    gauge!("chatty_db_connected").set(if connected { 1.0 } else { 0.0 });
}

pub fn record_error(kind: &'static str) {
    counter!("chatty_errors_total", "kind" => kind).increment(1);
}

/// Middleware recording count and latency of every request.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
