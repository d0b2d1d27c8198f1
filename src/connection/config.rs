//! Connection configuration.
//!
//! Callbacks plus the request options forwarded to the transport.
//!
//! # Example
//!
//! ```ignore
//! use shared_connection::ConnectionConfig;
//!
//! let config = ConnectionConfig::new()
//!     .on_message(|event| println!("{}", event.data))
//!     .on_error(|error| eprintln!("stream error: {error}"))
//!     .header("Authorization", "Bearer token");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};

use crate::error::{Error, Result};
use crate::protocol::{Credentials, OpenResponse, RequestOptions, StreamEvent};
use crate::transport::{CloseHandler, ErrorHandler, MessageHandler, OpenHandler};

// ============================================================================
// ConnectionConfig
// ============================================================================

/// Caller configuration for a [`SharedConnection`](super::SharedConnection).
///
/// Every callback is optional. The cancellation token for each stream
/// attempt is managed by the connection and cannot be supplied here.
#[derive(Clone, Default)]
pub struct ConnectionConfig {
    /// Called for every event, whether from the stream or from the leader.
    on_message: Option<MessageHandler>,
    /// Called when this tab's stream opens.
    on_open: Option<OpenHandler>,
    /// Called when this tab's stream is closed by the remote end.
    on_close: Option<CloseHandler>,
    /// Called for stream and coordination errors.
    on_error: Option<ErrorHandler>,
    /// Reserved. Stored but not acted upon.
    retry_when_error: bool,
    /// Passthrough request options.
    request: RequestOptions,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("on_message", &self.on_message.is_some())
            .field("on_open", &self.on_open.is_some())
            .field("on_close", &self.on_close.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("retry_when_error", &self.retry_when_error)
            .field("request", &self.request)
            .finish()
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ConnectionConfig {
    /// Creates a configuration with no callbacks and a plain `GET` request.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the event callback.
    #[must_use]
    pub fn on_message(mut self, handler: impl Fn(StreamEvent) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Arc::new(handler));
        self
    }

    /// Sets the open callback.
    ///
    /// Its result is handed back to the transport: `Err` rejects the response.
    #[must_use]
    pub fn on_open<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(OpenResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_open = Some(Arc::new(move |response: OpenResponse| {
            handler(response).boxed()
        }));
        self
    }

    /// Sets the remote close callback.
    #[must_use]
    pub fn on_close(mut self, handler: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(handler));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn on_error(mut self, handler: impl Fn(Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Sets the reserved retry flag.
    ///
    /// Accepted for compatibility; the connection never retries on its own.
    #[inline]
    #[must_use]
    pub fn retry_when_error(mut self, retry: bool) -> Self {
        self.retry_when_error = retry;
        self
    }

    /// Replaces the request options.
    #[inline]
    #[must_use]
    pub fn request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    /// Sets the HTTP method.
    #[inline]
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.request = self.request.with_method(method);
        self
    }

    /// Adds a request header.
    #[inline]
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.request = self.request.with_header(name, value);
        self
    }

    /// Sets the request body.
    #[inline]
    #[must_use]
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.request = self.request.with_body(body);
        self
    }

    /// Sets the credential mode.
    #[inline]
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.request = self.request.with_credentials(credentials);
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl ConnectionConfig {
    /// Returns the reserved retry flag.
    #[inline]
    #[must_use]
    pub fn is_retry_when_error(&self) -> bool {
        self.retry_when_error
    }

    /// Returns the request options forwarded to the transport.
    #[inline]
    #[must_use]
    pub fn request_options(&self) -> &RequestOptions {
        &self.request
    }
}

// ============================================================================
// Dispatch
// ============================================================================

impl ConnectionConfig {
    pub(crate) fn emit_message(&self, event: StreamEvent) {
        if let Some(handler) = &self.on_message {
            handler(event);
        }
    }

    /// Resolves to `Ok(())` when no open callback is set.
    pub(crate) fn emit_open(&self, response: OpenResponse) -> BoxFuture<'static, Result<()>> {
        match &self.on_open {
            Some(handler) => handler(response),
            None => future::ready(Ok(())).boxed(),
        }
    }

    pub(crate) fn emit_close(&self) {
        if let Some(handler) = &self.on_close {
            handler();
        }
    }

    pub(crate) fn emit_error(&self, error: Error) {
        if let Some(handler) = &self.on_error {
            handler(error);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::new();
        assert!(!config.is_retry_when_error());
        assert_eq!(config.request_options(), &RequestOptions::new());
    }

    #[test]
    fn test_request_shortcuts() {
        let config = ConnectionConfig::new()
            .method("POST")
            .header("X-Token", "abc")
            .body("{}")
            .credentials(Credentials::Include)
            .retry_when_error(true);

        let request = config.request_options();
        assert_eq!(request.method, "POST");
        assert_eq!(request.header("x-token"), Some("abc"));
        assert_eq!(request.credentials, Credentials::Include);
        assert!(config.is_retry_when_error());
    }

    #[test]
    fn test_missing_callbacks_are_noops() {
        let config = ConnectionConfig::new();
        config.emit_message(StreamEvent::data("x"));
        config.emit_close();
        config.emit_error(Error::transport("x"));
    }

    #[tokio::test]
    async fn test_open_defaults_to_accept() {
        let config = ConnectionConfig::new();
        assert!(config.emit_open(OpenResponse::ok()).await.is_ok());
    }

    #[tokio::test]
    async fn test_open_result_propagates() {
        let config = ConnectionConfig::new().on_open(|response: OpenResponse| async move {
            if response.is_success() {
                Ok(())
            } else {
                Err(Error::open_rejected(response.status, "bad status"))
            }
        });

        assert!(config.emit_open(OpenResponse::ok()).await.is_ok());
        assert!(matches!(
            config.emit_open(OpenResponse::new(500)).await,
            Err(Error::OpenRejected { status: 500, .. })
        ));
    }

    #[test]
    fn test_message_callback_receives_event() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let config = ConnectionConfig::new().on_message(move |event| {
            assert_eq!(event.data, "payload");
            seen.fetch_add(1, Ordering::SeqCst);
        });

        config.emit_message(StreamEvent::data("payload"));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
