//! Shared connection - one server-push stream per origin, shared by every tab.
//!
//! When several same-origin tabs subscribe to the same event-stream URL,
//! only one of them (the leader) holds the network connection. Every event
//! it receives is republished on a cross-tab broadcast channel so the other
//! tabs (followers) see the same stream without opening their own.
//!
//! # Architecture
//!
//! - **Election**: each tab requests an exclusive lock named after the URL;
//!   whoever holds it is the leader. The lock is held until the connection
//!   closes, then the next waiting tab takes over and opens a fresh stream.
//! - **Fan-out**: the leader posts each event on a broadcast channel named
//!   after the URL; followers deliver what they receive to their own handler.
//! - **Registry**: a tab holds at most one connection per URL; creating a
//!   second closes the first.
//!
//! The host capabilities (lock manager, broadcast hub, transport) are traits,
//! with in-process implementations provided for local coordination and tests.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use shared_connection::{ConnectionConfig, ConnectionState, LoopbackTransport, Origin, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let origin = Origin::local(Arc::new(LoopbackTransport::new()));
//!     let tab = origin.tab();
//!
//!     let connection = tab.connect(
//!         "https://example.com/events",
//!         ConnectionConfig::new()
//!             .on_message(|event| println!("{}", event.data))
//!             .on_error(|error| eprintln!("stream error: {error}")),
//!     )?;
//!
//!     connection.wait_for_state(ConnectionState::Open).await;
//!     connection.close();
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`origin`] | Composition root: [`Origin`], [`Tab`] |
//! | [`connection`] | [`SharedConnection`], configuration, state, registry |
//! | [`host`] | Lock manager and broadcast channel capabilities |
//! | [`transport`] | Stream transport seam and loopback implementation |
//! | [`protocol`] | Event and request types |
//! | [`error`] | Error types and [`Result`] alias |

// ============================================================================
// Modules
// ============================================================================

/// Shared connection lifecycle, election and registry.
pub mod connection;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Host coordination capabilities.
///
/// Traits for the cross-tab lock manager and broadcast channel, with
/// in-process implementations.
pub mod host;

/// Type-safe identifiers.
pub mod identifiers;

/// Lock and channel name derivation.
pub mod names;

/// Origins and tabs.
///
/// Use [`Origin::builder()`] or [`Origin::local()`] to create an origin.
pub mod origin;

/// Stream event and request types.
pub mod protocol;

/// Stream transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connection::{ConnectionConfig, ConnectionState, InstanceRegistry, SharedConnection};

// Error types
pub use error::{Error, Result};

// Host types
pub use host::{
    BroadcastChannel, BroadcastHub, LocalBroadcastHub, LocalLockManager, LockGuard, LockManager,
    LockSnapshot,
};

// Identifier types
pub use identifiers::{SubscriptionId, TabId};

// Origin types
pub use origin::{Origin, OriginBuilder, Tab};

// Protocol types
pub use protocol::{Credentials, OpenResponse, RequestOptions, StreamEvent};

// Transport types
pub use transport::{LoopbackStream, LoopbackTransport, StreamHandlers, StreamRequest, Transport};
