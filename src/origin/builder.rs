//! Builder pattern for origin configuration.
//!
//! Provides a fluent API for configuring and creating [`Origin`] instances.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shared_connection::{LocalBroadcastHub, LocalLockManager, LoopbackTransport, Origin};
//!
//! # fn example() -> shared_connection::Result<()> {
//! let origin = Origin::builder()
//!     .lock_manager(Arc::new(LocalLockManager::new()))
//!     .broadcast_hub(Arc::new(LocalBroadcastHub::new()))
//!     .transport(Arc::new(LoopbackTransport::new()))
//!     .base_url("https://app.example.com/")
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::error::{Error, Result};
use crate::host::{BroadcastHub, LockManager};
use crate::transport::Transport;

use super::core::Origin;

// ============================================================================
// OriginBuilder
// ============================================================================

/// Builder for configuring an [`Origin`].
///
/// Use [`Origin::builder()`] to create a new builder. The lock manager and
/// broadcast hub may be left unset to model a host that lacks them;
/// connecting on such an origin fails with
/// [`Error::Unsupported`](crate::Error::Unsupported).
#[derive(Default)]
pub struct OriginBuilder {
    /// Cross-tab lock manager.
    lock_manager: Option<Arc<dyn LockManager>>,
    /// Cross-tab broadcast hub.
    broadcast_hub: Option<Arc<dyn BroadcastHub>>,
    /// Stream transport.
    transport: Option<Arc<dyn Transport>>,
    /// Base for relative connection URLs.
    base_url: Option<String>,
}

impl fmt::Debug for OriginBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginBuilder")
            .field("lock_manager", &self.lock_manager.is_some())
            .field("broadcast_hub", &self.broadcast_hub.is_some())
            .field("transport", &self.transport.is_some())
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ============================================================================
// OriginBuilder Implementation
// ============================================================================

impl OriginBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lock manager used for leader election.
    #[inline]
    #[must_use]
    pub fn lock_manager(mut self, lock_manager: Arc<dyn LockManager>) -> Self {
        self.lock_manager = Some(lock_manager);
        self
    }

    /// Sets the broadcast hub used for fan-out.
    #[inline]
    #[must_use]
    pub fn broadcast_hub(mut self, broadcast_hub: Arc<dyn BroadcastHub>) -> Self {
        self.broadcast_hub = Some(broadcast_hub);
        self
    }

    /// Sets the stream transport.
    #[inline]
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the base URL relative connection URLs resolve against.
    #[inline]
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the origin with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if no transport is set
    /// - [`Error::InvalidUrl`] if the base URL does not parse
    pub fn build(self) -> Result<Origin> {
        let transport = self
            .transport
            .ok_or_else(|| Error::config("Transport is required"))?;

        let base_url = self
            .base_url
            .map(|base| Url::parse(&base).map_err(|e| Error::invalid_url(base, e)))
            .transpose()?;

        Ok(Origin::new(
            self.lock_manager,
            self.broadcast_hub,
            transport,
            base_url,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
