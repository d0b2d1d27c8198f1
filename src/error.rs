//! Error types for shared connections.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Construction is the only operation that returns an error directly.
//! Everything that goes wrong after that (transport failures, lock manager
//! failures, unresolvable URLs) is delivered to the caller's `on_error`
//! callback as an [`Error`] value.
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use shared_connection::{ConnectionConfig, Error, LoopbackTransport, Origin};
//!
//! let tab = Origin::local(Arc::new(LoopbackTransport::new())).tab();
//! match tab.connect("https://example.com/events", ConnectionConfig::new()) {
//!     Ok(connection) => { /* ... */ }
//!     Err(Error::Unsupported { capability }) => eprintln!("missing {capability}"),
//!     Err(e) => return Err(e),
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Environment | [`Error::Unsupported`], [`Error::Config`] |
//! | Stream | [`Error::InvalidUrl`], [`Error::Transport`], [`Error::OpenRejected`] |
//! | Coordination | [`Error::Lock`], [`Error::ChannelClosed`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use url::ParseError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Environment Errors
    // ========================================================================
    /// A required host capability is missing.
    ///
    /// Returned synchronously when a connection is constructed on an origin
    /// without a lock manager or broadcast hub.
    #[error("Shared connections are not supported here: missing {capability}")]
    Unsupported {
        /// Name of the missing capability.
        capability: &'static str,
    },

    /// Configuration error.
    ///
    /// Returned when an origin is built with an invalid configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Stream Errors
    // ========================================================================
    /// The connection URL could not be resolved to an absolute URL.
    #[error("Invalid url {url:?}: {source}")]
    InvalidUrl {
        /// URL as given by the caller.
        url: String,
        /// Underlying parse failure.
        #[source]
        source: ParseError,
    },

    /// The transport failed to open or keep the stream.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The stream was opened but the response was not accepted.
    #[error("Stream open rejected (status {status}): {message}")]
    OpenRejected {
        /// HTTP status of the response.
        status: u16,
        /// Why the response was rejected.
        message: String,
    },

    // ========================================================================
    // Coordination Errors
    // ========================================================================
    /// The lock manager failed to serve a lock request.
    #[error("Lock request {name:?} failed: {message}")]
    Lock {
        /// Lock name.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// Attempted to post on a closed broadcast channel.
    #[error("Broadcast channel closed: {name}")]
    ChannelClosed {
        /// Channel name.
        name: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an unsupported environment error.
    #[inline]
    pub fn unsupported(capability: &'static str) -> Self {
        Self::Unsupported { capability }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, source: ParseError) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            source,
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an open rejected error.
    #[inline]
    pub fn open_rejected(status: u16, message: impl Into<String>) -> Self {
        Self::OpenRejected {
            status,
            message: message.into(),
        }
    }

    /// Creates a lock error.
    #[inline]
    pub fn lock(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lock {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a channel closed error.
    #[inline]
    pub fn channel_closed(name: impl Into<String>) -> Self {
        Self::ChannelClosed { name: name.into() }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the environment cannot host shared connections.
    #[inline]
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Returns `true` if this error came from the stream itself.
    #[inline]
    #[must_use]
    pub fn is_stream_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. } | Self::Transport { .. } | Self::OpenRejected { .. }
        )
    }

    /// Returns `true` if this error came from cross-tab coordination.
    #[inline]
    #[must_use]
    pub fn is_coordination_error(&self) -> bool {
        matches!(self, Self::Lock { .. } | Self::ChannelClosed { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_display() {
        let err = Error::unsupported("lock manager");
        assert_eq!(
            err.to_string(),
            "Shared connections are not supported here: missing lock manager"
        );
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("transport is required");
        assert_eq!(err.to_string(), "Configuration error: transport is required");
    }

    #[test]
    fn test_invalid_url() {
        let source = url::Url::parse("/relative").unwrap_err();
        let err = Error::invalid_url("/relative", source);
        assert!(err.is_stream_error());
        assert!(err.to_string().starts_with("Invalid url \"/relative\""));
    }

    #[test]
    fn test_open_rejected_display() {
        let err = Error::open_rejected(503, "service unavailable");
        assert_eq!(
            err.to_string(),
            "Stream open rejected (status 503): service unavailable"
        );
        assert!(err.is_stream_error());
    }

    #[test]
    fn test_is_coordination_error() {
        let lock_err = Error::lock("a:lock", "host gone");
        let closed_err = Error::channel_closed("a:channel");
        let other_err = Error::transport("reset");

        assert!(lock_err.is_coordination_error());
        assert!(closed_err.is_coordination_error());
        assert!(!other_err.is_coordination_error());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
