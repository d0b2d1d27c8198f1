//! Connection lifecycle state.
//!
//! ```text
//! Connecting ──► Open ──► Closed
//!      │                    ▲
//!      └────────────────────┘
//! ```
//!
//! `Closed` is terminal.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of a [`SharedConnection`](super::SharedConnection).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Waiting for leadership or for the stream to open.
    #[default]
    Connecting,
    /// The leader's stream is open.
    Open,
    /// Torn down. Terminal.
    Closed,
}

impl ConnectionState {
    /// Returns `true` if moving from `self` to `next` is a legal edge.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Open)
                | (Self::Connecting, Self::Closed)
                | (Self::Open, Self::Closed)
        )
    }

    /// Returns `true` for the terminal state.
    #[inline]
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn any_state() -> impl Strategy<Value = ConnectionState> {
        prop_oneof![
            Just(ConnectionState::Connecting),
            Just(ConnectionState::Open),
            Just(ConnectionState::Closed),
        ]
    }

    #[test]
    fn test_legal_edges() {
        use ConnectionState::*;

        assert!(Connecting.can_transition_to(Open));
        assert!(Connecting.can_transition_to(Closed));
        assert!(Open.can_transition_to(Closed));

        assert!(!Open.can_transition_to(Connecting));
        assert!(!Closed.can_transition_to(Connecting));
        assert!(!Closed.can_transition_to(Open));
        assert!(!Closed.can_transition_to(Closed));
    }

    #[test]
    fn test_display_matches_serde() {
        for state in [
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::Closed,
        ] {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    proptest! {
        #[test]
        fn prop_closed_is_absorbing(attempts in proptest::collection::vec(any_state(), 0..32)) {
            let mut state = ConnectionState::Connecting;
            let mut seen_closed = false;

            for next in attempts {
                if state.can_transition_to(next) {
                    state = next;
                }
                if seen_closed {
                    prop_assert_eq!(state, ConnectionState::Closed);
                }
                seen_closed |= state.is_closed();
            }
        }

        #[test]
        fn prop_never_returns_to_connecting(from in any_state()) {
            prop_assert!(!from.can_transition_to(ConnectionState::Connecting));
        }
    }
}
