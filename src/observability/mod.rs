//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!     → tracing.rs (request spans with correlation IDs)
//!
//! Consumers:
//!     → Log aggregation (stdout; platform log drain in serverless mode)
//!     → Metrics endpoint (Prometheus scrape, local serve mode)
//! ```

pub mod logging;
pub mod metrics;
pub mod tracing;
