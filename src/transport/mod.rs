//! Event-stream transport seam.
//!
//! The transport is the collaborator that actually talks to the server. A
//! connection hands it a [`StreamRequest`] when (and only when) the tab is
//! leader; the transport reports back through the request's handlers until
//! the request's cancellation token fires.
//!
//! # Stream Lifecycle
//!
//! 1. `Transport::open` - Start the stream (synchronous failures return `Err`)
//! 2. `on_open` - Response received; its result accepts or rejects it
//! 3. `on_message` - Zero or more events
//! 4. `on_error` - Failures, reported as they happen
//! 5. `on_close` - Remote end finished the stream
//!
//! Cancellation of the request token must stop all further callbacks.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `handlers` | Callback types and `StreamHandlers` |
//! | `loopback` | In-process transport driven by hand |

// ============================================================================
// Imports
// ============================================================================

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Result;
use crate::protocol::RequestOptions;

// ============================================================================
// Submodules
// ============================================================================

/// Stream lifecycle callbacks.
pub mod handlers;

/// In-process transport.
pub mod loopback;

// ============================================================================
// Re-exports
// ============================================================================

pub use handlers::{CloseHandler, ErrorHandler, MessageHandler, OpenHandler, StreamHandlers};
pub use loopback::{LoopbackStream, LoopbackTransport};

// ============================================================================
// StreamRequest
// ============================================================================

/// Everything a transport needs to run one stream attempt.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Passthrough request options.
    pub options: RequestOptions,
    /// Fired when the attempt is superseded or the connection closes.
    pub cancel: CancellationToken,
    /// Lifecycle callbacks.
    pub handlers: StreamHandlers,
}

// ============================================================================
// Transport
// ============================================================================

/// Opens event streams.
pub trait Transport: Send + Sync {
    /// Starts streaming from `url`.
    ///
    /// Returns once the attempt is underway; progress is reported through
    /// `request.handlers`.
    ///
    /// # Errors
    ///
    /// Returns an error if the attempt cannot be started at all.
    fn open(&self, url: &Url, request: StreamRequest) -> Result<()>;
}
