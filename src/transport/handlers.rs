//! Stream lifecycle callbacks.
//!
//! The transport reports everything that happens to a stream through a
//! [`StreamHandlers`] bundle: received events, the open response, remote
//! close and errors.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::{Error, Result};
use crate::protocol::{OpenResponse, StreamEvent};

// ============================================================================
// Handler Types
// ============================================================================

/// Called for each received event.
pub type MessageHandler = Arc<dyn Fn(StreamEvent) + Send + Sync>;

/// Called with the response that opened the stream.
///
/// An `Err` tells the transport the response was not accepted.
pub type OpenHandler = Arc<dyn Fn(OpenResponse) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Called when the remote end closes the stream.
pub type CloseHandler = Arc<dyn Fn() + Send + Sync>;

/// Called for stream errors.
pub type ErrorHandler = Arc<dyn Fn(Error) + Send + Sync>;

// ============================================================================
// StreamHandlers
// ============================================================================

/// The callbacks a transport drives for one stream attempt.
#[derive(Clone)]
pub struct StreamHandlers {
    /// Event callback.
    pub on_message: MessageHandler,
    /// Open callback.
    pub on_open: OpenHandler,
    /// Remote close callback.
    pub on_close: CloseHandler,
    /// Error callback.
    pub on_error: ErrorHandler,
}

impl StreamHandlers {
    /// Delivers an event.
    #[inline]
    pub fn message(&self, event: StreamEvent) {
        (self.on_message)(event);
    }

    /// Reports the open response and returns whether it was accepted.
    #[inline]
    pub fn open(&self, response: OpenResponse) -> BoxFuture<'static, Result<()>> {
        (self.on_open)(response)
    }

    /// Reports a remote close.
    #[inline]
    pub fn close(&self) {
        (self.on_close)();
    }

    /// Reports an error.
    #[inline]
    pub fn error(&self, error: Error) {
        (self.on_error)(error);
    }
}

impl fmt::Debug for StreamHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandlers").finish_non_exhaustive()
    }
}
