//! Lazy, single-flight connection cache.
//!
//! # State Transitions
//! ```text
//! Unconnected → Connecting: first ensure_connected()
//! Connecting  → Connected:  attempt succeeds (handle cached)
//! Connecting  → Failed:     attempt fails or times out (error cached)
//! Failed      → Connecting: next ensure_connected(), never within the same call
//! Connected   → Connecting: cached handle reports itself dead
//! ```
//!
//! # Design Decisions
//! - The in-flight attempt is a `Shared` future; concurrent callers join it
//! - The slot mutex is never held across an await
//! - Only the caller that observes its own attempt still in the slot settles it
//! - A panicking connector settles the attempt as Failed

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::db::connector::{ConnectionHandle, Connector};
use crate::db::types::{ConnectionError, ConnectionResult, ConnectionState, ConnectionStatus};
use crate::observability::metrics;

type Attempt<H> = Shared<BoxFuture<'static, ConnectionResult<H>>>;

enum Slot<H> {
    Unconnected,
    Connecting { attempt: u64, future: Attempt<H> },
    Connected { attempt: u64, handle: H },
    Failed { attempt: u64, error: ConnectionError },
}

/// Process-wide cache for the one database connection.
///
/// Owned by the caller and shared via `Arc`; there is no teardown, the host
/// runtime reclaims the process.
pub struct ConnectionCache<C: Connector> {
    connector: Arc<C>,
    timeout: Duration,
    slot: Mutex<Slot<C::Handle>>,
    attempts: AtomicU64,
}

impl<C: Connector> ConnectionCache<C> {
    /// Create an unconnected cache. No I/O happens until first use.
    pub fn new(connector: C, timeout: Duration) -> Self {
        Self {
            connector: Arc::new(connector),
            timeout,
            slot: Mutex::new(Slot::Unconnected),
            attempts: AtomicU64::new(0),
        }
    }

    /// Return the cached handle, connecting first if needed.
    ///
    /// At most one attempt is in flight at any time; callers arriving while
    /// one is running wait for its outcome instead of starting another.
    pub async fn ensure_connected(&self) -> ConnectionResult<C::Handle> {
        let (attempt, future) = {
            let mut slot = self.lock_slot();
            match &*slot {
                Slot::Connected { handle, .. } if handle.is_live() => {
                    return Ok(handle.clone());
                }
                Slot::Connecting { attempt, future } => {
                    tracing::debug!(attempt, "Joining in-flight database connection attempt");
                    (*attempt, future.clone())
                }
                previous => {
                    match previous {
                        Slot::Connected { attempt, .. } => {
                            tracing::warn!(attempt, "Cached database connection reported dead, reconnecting");
                            metrics::record_db_connected(false);
                        }
                        Slot::Failed { attempt, error } => {
                            tracing::info!(attempt, error = %error, "Retrying database connection after failure");
                        }
                        _ => {}
                    }

                    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    let future = self.start_attempt(attempt);
                    *slot = Slot::Connecting {
                        attempt,
                        future: future.clone(),
                    };
                    (attempt, future)
                }
            }
        };

        let outcome = future.await;
        self.settle(attempt, &outcome);
        outcome
    }

    /// Current status. A connected handle that reports dead counts as unconnected.
    pub fn status(&self) -> ConnectionStatus {
        status_of(&self.lock_slot())
    }

    /// Snapshot of status, last error and attempt count, read under one lock.
    pub fn state(&self) -> ConnectionState {
        let slot = self.lock_slot();
        let last_error = match &*slot {
            Slot::Failed { error, .. } => Some(error.clone()),
            _ => None,
        };
        ConnectionState {
            status: status_of(&slot),
            last_error,
            attempts: self.attempts(),
        }
    }

    /// True when a live handle is cached.
    pub fn is_connected(&self) -> bool {
        self.status() == ConnectionStatus::Connected
    }

    /// The cached handle, if connected and live. Never performs I/O.
    pub fn handle(&self) -> Option<C::Handle> {
        match &*self.lock_slot() {
            Slot::Connected { handle, .. } if handle.is_live() => Some(handle.clone()),
            _ => None,
        }
    }

    /// Total connection attempts started.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    fn start_attempt(&self, attempt: u64) -> Attempt<C::Handle> {
        let connector = Arc::clone(&self.connector);
        let bound = self.timeout;

        tracing::info!(
            attempt,
            timeout_ms = bound.as_millis() as u64,
            "Opening database connection"
        );

        async move {
            let bounded = tokio::time::timeout(bound, connector.connect());
            match AssertUnwindSafe(bounded).catch_unwind().await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(ConnectionError::Timeout(bound)),
                Err(panic) => Err(ConnectionError::Transport(format!(
                    "connector panicked: {}",
                    panic_message(panic.as_ref())
                ))),
            }
        }
        .boxed()
        .shared()
    }

    fn settle(&self, attempt: u64, outcome: &ConnectionResult<C::Handle>) {
        let mut slot = self.lock_slot();
        let current = matches!(&*slot, Slot::Connecting { attempt: a, .. } if *a == attempt);
        if !current {
            return;
        }

        *slot = match outcome {
            Ok(handle) => {
                tracing::info!(attempt, "Database connected");
                metrics::record_connection_attempt("success");
                metrics::record_db_connected(true);
                Slot::Connected {
                    attempt,
                    handle: handle.clone(),
                }
            }
            Err(error) => {
                tracing::error!(attempt, error = %error, "Database connection failed");
                metrics::record_connection_attempt(error.kind());
                metrics::record_db_connected(false);
                Slot::Failed {
                    attempt,
                    error: error.clone(),
                }
            }
        };
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot<C::Handle>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn status_of<H: ConnectionHandle>(slot: &Slot<H>) -> ConnectionStatus {
    match slot {
        Slot::Unconnected => ConnectionStatus::Unconnected,
        Slot::Connecting { .. } => ConnectionStatus::Connecting,
        Slot::Connected { handle, .. } if handle.is_live() => ConnectionStatus::Connected,
        Slot::Connected { .. } => ConnectionStatus::Unconnected,
        Slot::Failed { .. } => ConnectionStatus::Failed,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

impl<C: Connector> std::fmt::Debug for ConnectionCache<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCache")
            .field("status", &self.status())
            .field("attempts", &self.attempts())
            .field("timeout", &self.timeout)
            .finish()
    }
}
