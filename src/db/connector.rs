//! The seam between the connection cache and a concrete database driver.

use async_trait::async_trait;

use crate::db::types::ConnectionResult;

/// An established connection that can be shared across requests.
pub trait ConnectionHandle: Clone + Send + Sync + 'static {
    /// Whether the connection is still usable. Must not perform I/O.
    fn is_live(&self) -> bool;
}

/// Something that can open a database connection.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Handle: ConnectionHandle;

    /// Perform one connection attempt. Retry policy belongs to the caller.
    async fn connect(&self) -> ConnectionResult<Self::Handle>;
}
