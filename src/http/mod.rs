//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Invocation (TCP listener or Lambda event)
//!     → server.rs (request ID, trace, timeout, CORS, body limit)
//!     → error.rs (render 500 envelope on the way out)
//!     → /api/health (handlers.rs, ungated)
//!     → dispatch.rs (ensure DB connection) → handlers.rs / routes.rs
//! ```

pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use routes::RouteGroups;
pub use server::HttpServer;
