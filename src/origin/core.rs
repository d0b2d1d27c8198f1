//! Origin: the capabilities shared by every tab.
//!
//! An [`Origin`] bundles what same-origin tabs have in common: the lock
//! manager, the broadcast hub, the stream transport and the base URL.
//! Tabs created from one origin coordinate with each other; tabs from
//! different origins never do.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::host::{BroadcastHub, LocalBroadcastHub, LocalLockManager, LockManager};
use crate::transport::Transport;

use super::builder::OriginBuilder;
use super::tab::Tab;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the origin.
pub(crate) struct OriginInner {
    /// Cross-tab lock manager, if the host has one.
    pub lock_manager: Option<Arc<dyn LockManager>>,
    /// Cross-tab broadcast hub, if the host has one.
    pub broadcast_hub: Option<Arc<dyn BroadcastHub>>,
    /// Stream transport.
    pub transport: Arc<dyn Transport>,
    /// Base for relative connection URLs.
    pub base_url: Option<Url>,
}

// ============================================================================
// Origin
// ============================================================================

/// Capabilities shared by a group of same-origin tabs.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use shared_connection::{ConnectionConfig, LoopbackTransport, Origin};
///
/// # async fn example() -> shared_connection::Result<()> {
/// let origin = Origin::local(Arc::new(LoopbackTransport::new()));
///
/// let first = origin.tab();
/// let second = origin.tab();
///
/// let a = first.connect("https://example.com/events", ConnectionConfig::new())?;
/// let b = second.connect("https://example.com/events", ConnectionConfig::new())?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Origin {
    /// Shared inner state.
    pub(crate) inner: Arc<OriginInner>,
}

// ============================================================================
// Origin - Display
// ============================================================================

impl fmt::Debug for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Origin")
            .field("lock_manager", &self.inner.lock_manager.is_some())
            .field("broadcast_hub", &self.inner.broadcast_hub.is_some())
            .field("base_url", &self.inner.base_url.as_ref().map(Url::as_str))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Origin - Constructors
// ============================================================================

impl Origin {
    /// Creates a configuration builder for the origin.
    #[inline]
    #[must_use]
    pub fn builder() -> OriginBuilder {
        OriginBuilder::new()
    }

    /// Creates an origin whose tabs coordinate within this process.
    ///
    /// Uses a fresh [`LocalLockManager`] and [`LocalBroadcastHub`].
    #[must_use]
    pub fn local(transport: Arc<dyn Transport>) -> Self {
        Self::new(
            Some(Arc::new(LocalLockManager::new())),
            Some(Arc::new(LocalBroadcastHub::new())),
            transport,
            None,
        )
    }

    pub(crate) fn new(
        lock_manager: Option<Arc<dyn LockManager>>,
        broadcast_hub: Option<Arc<dyn BroadcastHub>>,
        transport: Arc<dyn Transport>,
        base_url: Option<Url>,
    ) -> Self {
        debug!(
            lock_manager = lock_manager.is_some(),
            broadcast_hub = broadcast_hub.is_some(),
            "Origin created"
        );

        Self {
            inner: Arc::new(OriginInner {
                lock_manager,
                broadcast_hub,
                transport,
                base_url,
            }),
        }
    }
}

// ============================================================================
// Origin - Public API
// ============================================================================

impl Origin {
    /// Opens a new tab on this origin.
    #[must_use]
    pub fn tab(&self) -> Tab {
        Tab::new(self.clone())
    }

    /// Returns `true` if the host provides both coordination capabilities.
    #[inline]
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.inner.lock_manager.is_some() && self.inner.broadcast_hub.is_some()
    }

    /// Returns the lock manager, if any.
    #[inline]
    #[must_use]
    pub fn lock_manager(&self) -> Option<&Arc<dyn LockManager>> {
        self.inner.lock_manager.as_ref()
    }

    /// Returns the base URL, if any.
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> Option<&Url> {
        self.inner.base_url.as_ref()
    }
}
