//! Stream message types.
//!
//! This module defines what flows between the transport, the connection
//! and the broadcast channel.
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | `RequestOptions` | Connection → Transport | Passthrough request settings |
//! | `OpenResponse` | Transport → Connection | Response that opened the stream |
//! | `StreamEvent` | Transport → Connection → Channel | One received event |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `event` | `StreamEvent` and `OpenResponse` |
//! | `request` | `RequestOptions` and `Credentials` |

// ============================================================================
// Submodules
// ============================================================================

/// Stream event and open response types.
pub mod event;

/// Request options forwarded to the transport.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use event::{OpenResponse, StreamEvent};
pub use request::{Credentials, RequestOptions};
