//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin policy, preflight)
//!     → limits.rs (body size cap)
//!     → Pass to dispatcher and routes
//! ```

pub mod cors;
pub mod limits;
