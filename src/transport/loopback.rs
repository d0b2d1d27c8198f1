//! In-process transport driven by hand.
//!
//! [`LoopbackTransport`] records every stream it is asked to open and hands
//! out a [`LoopbackStream`] for each. Whoever holds the handle plays the
//! server: it opens the stream, pushes events, reports errors and closes.
//! Once the connection cancels an attempt, its handle goes inert.
//!
//! # Example
//!
//! ```ignore
//! let transport = Arc::new(LoopbackTransport::new());
//! let origin = Origin::local(transport.clone());
//! let connection = origin.tab().connect("https://example.com/events", config)?;
//!
//! let stream = transport.wait_for_stream(0).await;
//! stream.open(OpenResponse::ok()).await?;
//! stream.send(StreamEvent::data("hello"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::protocol::{OpenResponse, RequestOptions, StreamEvent};

use super::{StreamHandlers, StreamRequest, Transport};

// ============================================================================
// LoopbackTransport
// ============================================================================

/// Transport whose streams are driven through [`LoopbackStream`] handles.
pub struct LoopbackTransport {
    /// Every stream opened so far, in order.
    streams: Mutex<Vec<LoopbackStream>>,
    /// Number of streams opened, for waiters.
    opened: watch::Sender<usize>,
    /// If set, the next `open` fails with this message.
    refuse_next: Mutex<Option<String>>,
}

impl LoopbackTransport {
    /// Creates a transport with no streams.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(Vec::new()),
            opened: watch::Sender::new(0),
            refuse_next: Mutex::new(None),
        }
    }

    /// Makes the next `open` call fail synchronously with `message`.
    pub fn refuse_next(&self, message: impl Into<String>) {
        *self.refuse_next.lock() = Some(message.into());
    }

    /// Returns every stream opened so far.
    #[must_use]
    pub fn streams(&self) -> Vec<LoopbackStream> {
        self.streams.lock().clone()
    }

    /// Returns the number of streams opened so far.
    #[inline]
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.streams.lock().len()
    }

    /// Returns the number of streams not yet cancelled.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.streams
            .lock()
            .iter()
            .filter(|stream| !stream.is_cancelled())
            .count()
    }

    /// Waits until stream number `index` (zero-based) has been opened.
    pub async fn wait_for_stream(&self, index: usize) -> LoopbackStream {
        let mut opened = self.opened.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = opened.wait_for(|count| *count > index).await;
        self.streams.lock()[index].clone()
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoopbackTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackTransport")
            .field("streams", &self.stream_count())
            .finish_non_exhaustive()
    }
}

impl Transport for LoopbackTransport {
    fn open(&self, url: &Url, request: StreamRequest) -> Result<()> {
        if let Some(message) = self.refuse_next.lock().take() {
            return Err(Error::transport(message));
        }

        let stream = LoopbackStream {
            inner: Arc::new(StreamInner {
                url: url.clone(),
                options: request.options,
                cancel: request.cancel,
                handlers: request.handlers,
            }),
        };

        let count = {
            let mut streams = self.streams.lock();
            streams.push(stream);
            streams.len()
        };
        self.opened.send_replace(count);

        debug!(%url, index = count - 1, "Loopback stream opened");
        Ok(())
    }
}

// ============================================================================
// LoopbackStream
// ============================================================================

/// Shared state of one loopback stream.
struct StreamInner {
    /// Target URL.
    url: Url,
    /// Options the connection forwarded.
    options: RequestOptions,
    /// Attempt token from the connection.
    cancel: CancellationToken,
    /// Connection callbacks.
    handlers: StreamHandlers,
}

/// Server-side handle of one loopback stream.
///
/// Every method is a no-op once the connection has cancelled the attempt.
#[derive(Clone)]
pub struct LoopbackStream {
    inner: Arc<StreamInner>,
}

impl fmt::Debug for LoopbackStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopbackStream")
            .field("url", &self.inner.url.as_str())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl LoopbackStream {
    /// Returns the URL the stream was opened for.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Returns the forwarded request options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &RequestOptions {
        &self.inner.options
    }

    /// Returns `true` once the connection cancelled this attempt.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Waits until the connection cancels this attempt.
    pub async fn cancelled(&self) {
        self.inner.cancel.cancelled().await;
    }

    /// Delivers the open response.
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`] if the attempt was already cancelled
    /// - whatever the connection's open callback returned
    pub async fn open(&self, response: OpenResponse) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::transport("stream cancelled"));
        }
        self.inner.handlers.open(response).await
    }

    /// Delivers an event. Returns `false` if the attempt was cancelled.
    pub fn send(&self, event: StreamEvent) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.inner.handlers.message(event);
        true
    }

    /// Reports an error. Returns `false` if the attempt was cancelled.
    pub fn fail(&self, error: Error) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.inner.handlers.error(error);
        true
    }

    /// Closes the stream from the server side.
    ///
    /// Returns `false` if the attempt was cancelled.
    pub fn close(&self) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.inner.handlers.close();
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures_util::FutureExt;

    fn counting_handlers(messages: Arc<AtomicUsize>) -> StreamHandlers {
        StreamHandlers {
            on_message: Arc::new(move |_: StreamEvent| {
                messages.fetch_add(1, Ordering::SeqCst);
            }),
            on_open: Arc::new(|_: OpenResponse| async { Ok::<(), Error>(()) }.boxed()),
            on_close: Arc::new(|| {}),
            on_error: Arc::new(|_: Error| {}),
        }
    }

    fn request(cancel: CancellationToken, messages: Arc<AtomicUsize>) -> StreamRequest {
        StreamRequest {
            options: RequestOptions::new(),
            cancel,
            handlers: counting_handlers(messages),
        }
    }

    fn url() -> Url {
        Url::parse("https://example.com/events").unwrap()
    }

    #[tokio::test]
    async fn test_stream_delivers_until_cancelled() {
        let transport = LoopbackTransport::new();
        let messages = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        transport
            .open(&url(), request(cancel.clone(), Arc::clone(&messages)))
            .unwrap();

        let stream = transport.wait_for_stream(0).await;
        assert!(stream.open(OpenResponse::ok()).await.is_ok());
        assert!(stream.send(StreamEvent::data("a")));

        cancel.cancel();
        assert!(!stream.send(StreamEvent::data("b")));
        assert!(stream.open(OpenResponse::ok()).await.is_err());
        assert_eq!(messages.load(Ordering::SeqCst), 1);
        assert_eq!(transport.active_count(), 0);
    }

    #[test]
    fn test_refuse_next_fails_once() {
        let transport = LoopbackTransport::new();
        let messages = Arc::new(AtomicUsize::new(0));
        transport.refuse_next("network down");

        let first = transport.open(&url(), request(CancellationToken::new(), Arc::clone(&messages)));
        let second = transport.open(&url(), request(CancellationToken::new(), messages));

        assert!(matches!(first, Err(Error::Transport { .. })));
        assert!(second.is_ok());
        assert_eq!(transport.stream_count(), 1);
    }
}
