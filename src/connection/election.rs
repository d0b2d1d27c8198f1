//! Leader election.
//!
//! Every connection asks the lock manager for the lock named after its URL.
//! The tab that is granted the lock is leader: it launches the stream and
//! keeps the lock until its release signal fires. Dropping the guard then
//! lets the lock manager grant the next waiting tab.
//!
//! The release signal also abandons a request that has not been granted
//! yet, so a connection closed while waiting never becomes leader.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::host::LockManager;
use crate::names::lock_name;

use super::core::ConnectionInner;

// ============================================================================
// Election Task
// ============================================================================

/// Acquires leadership, launches, and holds until released.
pub(crate) async fn run(inner: Arc<ConnectionInner>, locks: Arc<dyn LockManager>) {
    let name = lock_name(&inner.url);

    let acquired = tokio::select! {
        biased;
        _ = inner.release.cancelled() => {
            debug!(url = %inner.url, tab_id = %inner.tab_id, "Lock request abandoned");
            return;
        }
        acquired = locks.acquire(&name) => acquired,
    };

    let guard = match acquired {
        Ok(guard) => guard,
        Err(e) => {
            warn!(url = %inner.url, tab_id = %inner.tab_id, error = %e, "Lock request failed");
            inner.config.emit_error(e);
            return;
        }
    };

    {
        let _attempt = inner.attempt.lock();
        if inner.release.is_cancelled() {
            debug!(url = %inner.url, tab_id = %inner.tab_id, "Closed while lock was granted");
            return;
        }
        inner.leader.send_replace(true);
    }

    info!(url = %inner.url, tab_id = %inner.tab_id, lock = guard.name(), "Leadership acquired");
    inner.launch();

    inner.release.cancelled().await;

    inner.leader.send_replace(false);
    drop(guard);

    info!(url = %inner.url, tab_id = %inner.tab_id, "Leadership released");
}

// ============================================================================
// Tests
// ============================================================================
