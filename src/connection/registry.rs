//! Per-tab instance registry.
//!
//! A tab holds at most one live connection per URL. Registering a second
//! one closes the first: last writer wins.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::warn;

use super::core::SharedConnection;

// ============================================================================
// InstanceRegistry
// ============================================================================

/// URL → connection map for one tab.
///
/// Entries are never removed; a closed connection stays mapped until it is
/// replaced.
#[derive(Default)]
pub struct InstanceRegistry {
    /// Connections by URL.
    entries: Mutex<FxHashMap<String, SharedConnection>>,
}

impl InstanceRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `connection` under its URL.
    ///
    /// An existing entry for the same URL is closed first, with a warning.
    /// Returns the replaced connection.
    pub fn register(&self, connection: SharedConnection) -> Option<SharedConnection> {
        let url = connection.url().to_string();
        let previous = self.entries.lock().get(&url).cloned();

        if let Some(previous) = &previous {
            warn!(
                url = %url,
                tab_id = %previous.tab_id(),
                "Duplicate connection for url; only one instance per tab is allowed, dropping the old instance"
            );
            previous.close();
        }

        self.entries.lock().insert(url, connection);
        previous
    }

    /// Returns the current entry for `url`.
    #[must_use]
    pub fn lookup(&self, url: &str) -> Option<SharedConnection> {
        self.entries.lock().get(url).cloned()
    }

    /// Returns every registered connection.
    #[must_use]
    pub fn connections(&self) -> Vec<SharedConnection> {
        self.entries.lock().values().cloned().collect()
    }

    /// Returns the number of entries, closed ones included.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing was ever registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("entries", &self.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::connection::ConnectionConfig;
    use crate::connection::core::ConnectionParts;
    use crate::host::{BroadcastHub, LocalBroadcastHub};
    use crate::identifiers::TabId;
    use crate::transport::LoopbackTransport;

    fn connection(url: &str) -> SharedConnection {
        let hub = LocalBroadcastHub::new();
        SharedConnection::new(ConnectionParts {
            url: url.to_string(),
            tab_id: TabId::next(),
            base_url: None,
            config: ConnectionConfig::new(),
            transport: Arc::new(LoopbackTransport::new()),
            channel: hub.open(url).unwrap(),
        })
    }

    #[test]
    fn test_lookup_missing() {
        let registry = InstanceRegistry::new();
        assert!(registry.lookup("https://example.com/a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_closes_previous() {
        let registry = InstanceRegistry::new();
        let first = connection("https://example.com/a");
        let second = connection("https://example.com/a");

        assert!(registry.register(first.clone()).is_none());
        let replaced = registry.register(second.clone());

        assert!(replaced.is_some_and(|replaced| replaced.ptr_eq(&first)));
        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert!(registry.lookup("https://example.com/a").is_some_and(|c| c.ptr_eq(&second)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_urls_coexist() {
        let registry = InstanceRegistry::new();
        let a = connection("https://example.com/a");
        let b = connection("https://example.com/b");

        registry.register(a.clone());
        registry.register(b.clone());

        assert!(!a.is_closed());
        assert!(!b.is_closed());
        assert_eq!(registry.connections().len(), 2);
    }
}
