//! Named exclusive locks shared by every tab of an origin.
//!
//! Holding the lock for a URL is what makes a tab the leader for that URL.
//! The [`LockManager`] trait is the seam to whatever provides mutual
//! exclusion across tabs; [`LocalLockManager`] serves tabs living in the
//! same process.
//!
//! # Semantics
//!
//! - `acquire` may wait indefinitely and grants in FIFO order per name
//! - dropping the `acquire` future abandons the request
//! - dropping the returned [`LockGuard`] releases the lock

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::Result;

// ============================================================================
// LockManager
// ============================================================================

/// Host-provided exclusive lock manager.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Waits until the lock called `name` is granted to this caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lock`](crate::Error::Lock) if the host cannot serve
    /// the request.
    async fn acquire(&self, name: &str) -> Result<LockGuard>;

    /// Returns a snapshot of held and pending locks.
    fn query(&self) -> LockSnapshot;
}

// ============================================================================
// LockGuard
// ============================================================================

/// A granted lock. Released when dropped.
pub struct LockGuard {
    /// Lock name.
    name: String,
    /// Release hook supplied by the lock manager.
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
    /// Creates a guard that runs `release` when dropped.
    pub fn new(name: impl Into<String>, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name: name.into(),
            release: Some(Box::new(release)),
        }
    }

    /// Returns the lock name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

// ============================================================================
// LockSnapshot
// ============================================================================

/// Point-in-time view of a lock manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSnapshot {
    /// Names of currently held locks.
    pub held: Vec<String>,
    /// One entry per waiting request.
    pub pending: Vec<String>,
}

impl LockSnapshot {
    /// Returns `true` if `name` is currently held.
    #[inline]
    #[must_use]
    pub fn is_held(&self, name: &str) -> bool {
        self.held.iter().any(|held| held == name)
    }

    /// Returns the number of requests waiting on `name`.
    #[inline]
    #[must_use]
    pub fn pending_count(&self, name: &str) -> usize {
        self.pending.iter().filter(|pending| *pending == name).count()
    }
}

// ============================================================================
// LocalLockManager
// ============================================================================

/// Per-name bookkeeping.
#[derive(Default)]
struct LockSlot {
    /// FIFO-fair mutex backing the lock.
    mutex: Arc<tokio::sync::Mutex<()>>,
    /// Whether a guard is outstanding.
    held: AtomicBool,
    /// Requests currently waiting.
    pending: AtomicUsize,
}

/// Decrements the pending count when the request finishes or is abandoned.
struct PendingRequest(Arc<LockSlot>);

impl PendingRequest {
    fn new(slot: Arc<LockSlot>) -> Self {
        slot.pending.fetch_add(1, Ordering::SeqCst);
        Self(slot)
    }
}

impl Drop for PendingRequest {
    fn drop(&mut self) {
        self.0.pending.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-process lock manager.
///
/// Every tab created from the same [`Origin`](crate::Origin) shares one
/// instance. Grants are FIFO per name.
#[derive(Default)]
pub struct LocalLockManager {
    /// Lock slots by name. Slots are never removed.
    slots: Mutex<FxHashMap<String, Arc<LockSlot>>>,
}

impl LocalLockManager {
    /// Creates an empty lock manager.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `name`, creating it on first use.
    fn slot(&self, name: &str) -> Arc<LockSlot> {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(name.to_string()).or_default())
    }
}

impl fmt::Debug for LocalLockManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalLockManager")
            .field("locks", &self.slots.lock().len())
            .finish()
    }
}

#[async_trait]
impl LockManager for LocalLockManager {
    async fn acquire(&self, name: &str) -> Result<LockGuard> {
        let slot = self.slot(name);
        let pending = PendingRequest::new(Arc::clone(&slot));

        trace!(name, "Lock requested");
        let guard = Arc::clone(&slot.mutex).lock_owned().await;
        drop(pending);

        slot.held.store(true, Ordering::SeqCst);
        trace!(name, "Lock granted");

        let name_owned = name.to_string();
        Ok(LockGuard::new(name, move || {
            slot.held.store(false, Ordering::SeqCst);
            drop(guard);
            trace!(name = %name_owned, "Lock released");
        }))
    }

    fn query(&self) -> LockSnapshot {
        let slots = self.slots.lock();
        let mut snapshot = LockSnapshot::default();

        for (name, slot) in slots.iter() {
            if slot.held.load(Ordering::SeqCst) {
                snapshot.held.push(name.clone());
            }
            let waiting = slot.pending.load(Ordering::SeqCst);
            snapshot
                .pending
                .extend(std::iter::repeat_n(name.clone(), waiting));
        }

        snapshot
    }
}

// ============================================================================
// Tests
// ============================================================================
