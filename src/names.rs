//! Derived resource names.
//!
//! Every tab that connects to the same URL derives the same lock and
//! channel names, so they contend on one lock and share one channel.
//! Different URLs never collide.

/// Prefix shared by every derived name.
pub const NAME_PREFIX: &str = "shared-persistent-connection";

/// Returns the cross-tab lock name for `url`.
#[inline]
#[must_use]
pub fn lock_name(url: &str) -> String {
    derive(url, "lock")
}

/// Returns the broadcast channel name for `url`.
#[inline]
#[must_use]
pub fn channel_name(url: &str) -> String {
    derive(url, "channel")
}

fn derive(url: &str, kind: &str) -> String {
    format!("{NAME_PREFIX}:{url}:{kind}")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_name_format() {
        assert_eq!(
            lock_name("/api/events"),
            "shared-persistent-connection:/api/events:lock"
        );
        assert_eq!(
            channel_name("/api/events"),
            "shared-persistent-connection:/api/events:channel"
        );
    }

    proptest! {
        #[test]
        fn prop_names_are_deterministic(url in ".*") {
            prop_assert_eq!(lock_name(&url), lock_name(&url));
            prop_assert_eq!(channel_name(&url), channel_name(&url));
        }

        #[test]
        fn prop_distinct_urls_never_share_names(a in "[a-z/]{1,16}", b in "[a-z/]{1,16}") {
            prop_assume!(a != b);
            prop_assert_ne!(lock_name(&a), lock_name(&b));
            prop_assert_ne!(channel_name(&a), channel_name(&b));
        }

        #[test]
        fn prop_lock_and_channel_never_collide(a in ".*", b in ".*") {
            prop_assert_ne!(lock_name(&a), channel_name(&b));
        }
    }
}
