//! Type-safe identifiers.
//!
//! Newtype wrappers keep tab and subscription ids from being mixed up.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

// ============================================================================
// TabId
// ============================================================================

/// Process-unique identifier of a [`Tab`](crate::Tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(NonZeroU64);

/// Next tab id to hand out.
static NEXT_TAB_ID: AtomicU64 = AtomicU64::new(1);

impl TabId {
    /// Allocates the next unused tab id.
    #[must_use]
    pub fn next() -> Self {
        let id = NEXT_TAB_ID.fetch_add(1, Ordering::Relaxed);
        // Counter starts at 1 and would need 2^64 tabs to wrap.
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }

    /// Creates a tab id from a raw value. Returns `None` for zero.
    #[inline]
    #[must_use]
    pub fn new(id: u64) -> Option<Self> {
        NonZeroU64::new(id).map(Self)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// SubscriptionId
// ============================================================================

/// Identifies one subscription to a broadcast channel.
///
/// Used to suppress delivery of a subscriber's own posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generates a fresh random id.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_id_next_is_unique() {
        let a = TabId::next();
        let b = TabId::next();
        assert_ne!(a, b);
        assert!(b.as_u64() > a.as_u64());
    }

    #[test]
    fn test_tab_id_rejects_zero() {
        assert!(TabId::new(0).is_none());
        assert_eq!(TabId::new(7).map(|id| id.to_string()), Some("7".into()));
    }

    #[test]
    fn test_subscription_ids_differ() {
        assert_ne!(SubscriptionId::generate(), SubscriptionId::generate());
    }
}
