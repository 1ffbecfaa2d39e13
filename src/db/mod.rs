//! Database connection subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → cache.rs (ensure_connected: reuse, join in-flight attempt, or start one)
//!     → connector.rs (Connector seam)
//!     → mongo.rs (parse URI, connect, ping, track liveness)
//!     → handle cached and shared with every request
//! ```
//!
//! # Design Decisions
//! - Connection is lazy: nothing is dialed until the first gated request
//! - Single-flight: one attempt at a time, concurrent callers share its outcome
//! - No retries inside a call; the next invocation retries

pub mod cache;
pub mod connector;
pub mod mongo;
pub mod types;

pub use cache::ConnectionCache;
pub use connector::{ConnectionHandle, Connector};
pub use mongo::{MongoConnector, MongoHandle};
pub use types::{ConnectionError, ConnectionResult, ConnectionState, ConnectionStatus};
