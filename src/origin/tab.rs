//! Tab: one browsing context on an origin.
//!
//! Each [`Tab`] owns an [`InstanceRegistry`] and is the only place
//! connections are constructed. Dropping the last handle on a tab closes
//! every connection it registered, releasing any leadership it held.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::connection::core::ConnectionParts;
use crate::connection::{ConnectionConfig, InstanceRegistry, SharedConnection};
use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::names::channel_name;

use super::core::Origin;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for a tab.
pub(crate) struct TabInner {
    /// Tab identifier.
    id: TabId,
    /// Origin the tab belongs to.
    origin: Origin,
    /// Live connections by URL.
    registry: InstanceRegistry,
}

impl Drop for TabInner {
    fn drop(&mut self) {
        for connection in self.registry.connections() {
            connection.close();
        }
        debug!(tab_id = %self.id, "Tab dropped");
    }
}

// ============================================================================
// Tab
// ============================================================================

/// A tab on an [`Origin`].
///
/// # Example
///
/// ```ignore
/// let tab = origin.tab();
/// let connection = tab.connect(
///     "https://example.com/events",
///     ConnectionConfig::new().on_message(|event| println!("{}", event.data)),
/// )?;
/// ```
#[derive(Clone)]
pub struct Tab {
    /// Shared inner state.
    pub(crate) inner: Arc<TabInner>,
}

// ============================================================================
// Tab - Display
// ============================================================================

impl fmt::Debug for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tab")
            .field("id", &self.inner.id)
            .field("connections", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tab - Constructor
// ============================================================================

impl Tab {
    pub(crate) fn new(origin: Origin) -> Self {
        let id = TabId::next();
        debug!(tab_id = %id, "Tab created");

        Self {
            inner: Arc::new(TabInner {
                id,
                origin,
                registry: InstanceRegistry::new(),
            }),
        }
    }
}

// ============================================================================
// Tab - Accessors
// ============================================================================

impl Tab {
    /// Returns the tab id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> TabId {
        self.inner.id
    }

    /// Returns the origin this tab belongs to.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.inner.origin
    }

    /// Returns this tab's instance registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &InstanceRegistry {
        &self.inner.registry
    }

    /// Returns the registered connection for `url`.
    #[inline]
    #[must_use]
    pub fn lookup(&self, url: &str) -> Option<SharedConnection> {
        self.inner.registry.lookup(url)
    }
}

// ============================================================================
// Tab - Connections
// ============================================================================

impl Tab {
    /// Constructs a shared connection for `url`.
    ///
    /// Registers it (closing any earlier connection for the same URL in
    /// this tab), subscribes to the URL's broadcast channel and starts
    /// competing for leadership. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`Error::Unsupported`] if the origin lacks a lock manager or
    ///   broadcast hub
    /// - whatever the broadcast hub returns when subscribing fails
    pub fn connect(
        &self,
        url: impl Into<String>,
        config: ConnectionConfig,
    ) -> Result<SharedConnection> {
        let origin = &self.inner.origin.inner;

        let lock_manager = origin
            .lock_manager
            .clone()
            .ok_or_else(|| Error::unsupported("lock manager"))?;
        let broadcast_hub = origin
            .broadcast_hub
            .as_ref()
            .ok_or_else(|| Error::unsupported("broadcast channel"))?;

        let url = url.into();
        let channel = broadcast_hub.open(&channel_name(&url))?;

        let connection = SharedConnection::new(ConnectionParts {
            url,
            tab_id: self.inner.id,
            base_url: origin.base_url.clone(),
            config,
            transport: Arc::clone(&origin.transport),
            channel,
        });

        self.inner.registry.register(connection.clone());
        connection.start(Arc::clone(&lock_manager));

        let locks = lock_manager.query();
        debug!(
            url = %connection.url(),
            tab_id = %self.inner.id,
            held = ?locks.held,
            pending = ?locks.pending,
            "Lock manager state"
        );

        Ok(connection)
    }

    /// Closes every connection registered in this tab.
    pub fn close_all(&self) {
        for connection in self.inner.registry.connections() {
            connection.close();
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::connection::ConnectionState;
    use crate::host::LocalLockManager;
    use crate::transport::LoopbackTransport;

    const URL: &str = "https://example.com/events";

    #[test]
    fn test_connect_without_lock_manager_is_unsupported() {
        let origin = Origin::builder()
            .broadcast_hub(Arc::new(crate::host::LocalBroadcastHub::new()))
            .transport(Arc::new(LoopbackTransport::new()))
            .build()
            .unwrap();

        let result = origin.tab().connect(URL, ConnectionConfig::new());
        assert!(matches!(
            result,
            Err(Error::Unsupported { capability: "lock manager" })
        ));
    }

    #[test]
    fn test_connect_without_broadcast_hub_is_unsupported() {
        let origin = Origin::builder()
            .lock_manager(Arc::new(LocalLockManager::new()))
            .transport(Arc::new(LoopbackTransport::new()))
            .build()
            .unwrap();

        let result = origin.tab().connect(URL, ConnectionConfig::new());
        assert!(result.is_err_and(|e| e.is_unsupported()));
    }

    #[tokio::test]
    async fn test_connect_registers_and_starts() {
        let origin = Origin::local(Arc::new(LoopbackTransport::new()));
        let tab = origin.tab();

        let connection = tab.connect(URL, ConnectionConfig::new()).unwrap();

        assert_eq!(connection.state(), ConnectionState::Connecting);
        assert_eq!(connection.tab_id(), tab.id());
        assert!(tab.lookup(URL).is_some_and(|c| c.ptr_eq(&connection)));
        assert!(connection.wait_for_leadership().await);
    }

    #[tokio::test]
    async fn test_dropping_tab_closes_connections() {
        let origin = Origin::local(Arc::new(LoopbackTransport::new()));
        let tab = origin.tab();
        let connection = tab.connect(URL, ConnectionConfig::new()).unwrap();

        drop(tab);
        assert!(connection.is_closed());
    }

    #[tokio::test]
    async fn test_close_all() {
        let origin = Origin::local(Arc::new(LoopbackTransport::new()));
        let tab = origin.tab();
        let a = tab.connect("https://example.com/a", ConnectionConfig::new()).unwrap();
        let b = tab.connect("https://example.com/b", ConnectionConfig::new()).unwrap();

        tab.close_all();
        assert!(a.is_closed());
        assert!(b.is_closed());
    }
}
