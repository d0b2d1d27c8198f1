//! Shared connection lifecycle.
//!
//! A [`SharedConnection`] is one tab's handle on the stream for a URL. Only
//! the leader tab opens the real stream; every tab, leader or not, hears
//! events through the broadcast channel.
//!
//! # Tasks
//!
//! Each connection runs two tokio tasks:
//!
//! - **subscriber**: forwards broadcast events to `on_message` until the
//!   channel is closed
//! - **election**: waits for the cross-tab lock, launches the stream, then
//!   holds the lock until the release signal fires
//!
//! # Close Order
//!
//! 1. Release leadership (other tabs may be elected from here on)
//! 2. Cancel the in-flight stream attempt
//! 3. Close the broadcast subscription
//! 4. Publish `Closed`

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::host::{BroadcastChannel, LockManager};
use crate::identifiers::TabId;
use crate::protocol::{OpenResponse, StreamEvent};
use crate::transport::{StreamHandlers, StreamRequest, Transport};

use super::config::ConnectionConfig;
use super::election;
use super::state::ConnectionState;

// ============================================================================
// Types
// ============================================================================

/// Everything needed to build a connection.
pub(crate) struct ConnectionParts {
    /// Identity key, as given by the caller.
    pub url: String,
    /// Owning tab.
    pub tab_id: TabId,
    /// Base for resolving relative URLs.
    pub base_url: Option<Url>,
    /// Caller configuration.
    pub config: ConnectionConfig,
    /// Stream transport.
    pub transport: Arc<dyn Transport>,
    /// This connection's broadcast subscription.
    pub channel: Arc<dyn BroadcastChannel>,
}

/// Internal shared state for a connection.
pub(crate) struct ConnectionInner {
    /// Identity key.
    pub url: String,
    /// Owning tab.
    pub tab_id: TabId,
    /// Base for resolving relative URLs.
    base_url: Option<Url>,
    /// Caller configuration.
    pub config: ConnectionConfig,
    /// Stream transport.
    transport: Arc<dyn Transport>,
    /// Broadcast subscription.
    pub channel: Arc<dyn BroadcastChannel>,
    /// Lifecycle state.
    state: watch::Sender<ConnectionState>,
    /// Whether this tab currently holds the lock.
    pub leader: watch::Sender<bool>,
    /// Token of the current stream attempt. Also serializes leadership flips.
    pub attempt: Mutex<Option<CancellationToken>>,
    /// Leadership release signal.
    pub release: CancellationToken,
    /// Set once by `close`.
    closed: AtomicBool,
}

// ============================================================================
// SharedConnection
// ============================================================================

/// One tab's handle on the shared stream for a URL.
///
/// Cloning is cheap; clones refer to the same connection. Dropping handles
/// does not close the connection; call [`close`](Self::close) or drop the
/// owning [`Tab`](crate::Tab).
///
/// # Example
///
/// ```ignore
/// let connection = tab.connect("https://example.com/events", config)?;
/// if connection.wait_for_leadership().await {
///     println!("this tab owns the stream");
/// }
/// connection.close();
/// ```
#[derive(Clone)]
pub struct SharedConnection {
    /// Shared inner state.
    pub(crate) inner: Arc<ConnectionInner>,
}

// ============================================================================
// SharedConnection - Display
// ============================================================================

impl fmt::Debug for SharedConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedConnection")
            .field("url", &self.inner.url)
            .field("tab_id", &self.inner.tab_id)
            .field("state", &self.state())
            .field("is_leader", &self.is_leader())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SharedConnection - Constructor
// ============================================================================

impl SharedConnection {
    /// Creates a connection in `Connecting` state. Nothing runs until
    /// [`start`](Self::start).
    pub(crate) fn new(parts: ConnectionParts) -> Self {
        debug!(url = %parts.url, tab_id = %parts.tab_id, "Connection created");

        Self {
            inner: Arc::new(ConnectionInner {
                url: parts.url,
                tab_id: parts.tab_id,
                base_url: parts.base_url,
                config: parts.config,
                transport: parts.transport,
                channel: parts.channel,
                state: watch::Sender::new(ConnectionState::Connecting),
                leader: watch::Sender::new(false),
                attempt: Mutex::new(None),
                release: CancellationToken::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Spawns the subscriber and election tasks.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn start(&self, locks: Arc<dyn LockManager>) {
        tokio::spawn(run_subscriber(Arc::clone(&self.inner)));
        tokio::spawn(election::run(Arc::clone(&self.inner), locks));
    }
}

// ============================================================================
// SharedConnection - Accessors
// ============================================================================

impl SharedConnection {
    /// Returns the URL this connection was created for.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Returns the caller configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Returns the owning tab's id.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.inner.tab_id
    }

    /// Returns the current lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    /// Returns `true` while this tab holds the cross-tab lock for the URL.
    #[inline]
    #[must_use]
    pub fn is_leader(&self) -> bool {
        *self.inner.leader.borrow()
    }

    /// Returns `true` once the connection is closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state().is_closed()
    }

    /// Returns `true` if `other` is a handle on the same connection.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ============================================================================
// SharedConnection - Observation
// ============================================================================

impl SharedConnection {
    /// Returns a receiver that observes every state change.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Waits until the state is `target` or the connection is closed.
    ///
    /// Returns the state observed when waiting ended.
    pub async fn wait_for_state(&self, target: ConnectionState) -> ConnectionState {
        let mut state = self.inner.state.subscribe();
        match state
            .wait_for(|current| *current == target || current.is_closed())
            .await
        {
            Ok(current) => *current,
            Err(_) => self.state(),
        }
    }

    /// Waits until this tab becomes leader or the connection is closed.
    ///
    /// Returns `true` if this tab is leader.
    pub async fn wait_for_leadership(&self) -> bool {
        let mut leader = self.inner.leader.subscribe();
        let mut state = self.inner.state.subscribe();

        loop {
            if *leader.borrow_and_update() {
                return true;
            }
            if state.borrow_and_update().is_closed() {
                return false;
            }

            // Both senders live in `self.inner`, so neither channel can close.
            tokio::select! {
                _ = leader.changed() => {}
                _ = state.changed() => {}
            }
        }
    }
}

// ============================================================================
// SharedConnection - Lifecycle
// ============================================================================

impl SharedConnection {
    /// Starts a fresh stream attempt, cancelling the previous one.
    ///
    /// No-op unless this tab is leader and the connection is open or
    /// connecting. Called automatically when leadership is granted; callers
    /// may call it again to restart the stream.
    pub fn launch(&self) {
        self.inner.launch();
    }

    /// Closes the connection. Idempotent.
    ///
    /// Releases leadership, cancels the stream attempt and closes the
    /// broadcast subscription.
    pub fn close(&self) {
        self.inner.close();
    }
}

// ============================================================================
// ConnectionInner - Lifecycle
// ============================================================================

impl ConnectionInner {
    /// Returns `true` once `close` has started.
    #[inline]
    pub(crate) fn is_closing(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn launch(self: &Arc<Self>) {
        let token = {
            let mut attempt = self.attempt.lock();

            if !*self.leader.borrow() || self.is_closing() {
                trace!(url = %self.url, tab_id = %self.tab_id, "Launch skipped");
                return;
            }

            if let Some(previous) = attempt.take() {
                previous.cancel();
                debug!(url = %self.url, tab_id = %self.tab_id, "Previous stream attempt cancelled");
            }

            let token = CancellationToken::new();
            *attempt = Some(token.clone());
            token
        };

        let target = match self.resolve_target() {
            Ok(target) => target,
            Err(e) => {
                warn!(url = %self.url, error = %e, "Cannot resolve stream url");
                self.config.emit_error(e);
                return;
            }
        };

        let request = StreamRequest {
            options: self.config.request_options().clone(),
            cancel: token.clone(),
            handlers: self.stream_handlers(&token),
        };

        debug!(url = %self.url, tab_id = %self.tab_id, target = %target, "Opening stream");

        if let Err(e) = self.transport.open(&target, request) {
            warn!(url = %self.url, error = %e, "Stream failed to start");
            self.config.emit_error(e);
        }
    }

    pub(crate) fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.release.cancel();

        {
            let mut attempt = self.attempt.lock();
            if let Some(token) = attempt.take() {
                token.cancel();
            }
            self.leader.send_replace(false);
        }

        self.channel.close();
        self.state.send_replace(ConnectionState::Closed);

        info!(url = %self.url, tab_id = %self.tab_id, "Connection closed");
    }

    /// Resolves the identity key to the absolute stream URL.
    fn resolve_target(&self) -> Result<Url> {
        let resolved = match &self.base_url {
            Some(base) => base.join(&self.url),
            None => Url::parse(&self.url),
        };
        resolved.map_err(|e| Error::invalid_url(&self.url, e))
    }
}

// ============================================================================
// ConnectionInner - Stream Callbacks
// ============================================================================

impl ConnectionInner {
    /// Builds the callbacks for one stream attempt.
    ///
    /// Callbacks hold a weak reference and go silent once `token` is
    /// cancelled, so a superseded attempt cannot reach the connection.
    fn stream_handlers(self: &Arc<Self>, token: &CancellationToken) -> StreamHandlers {
        let weak = Arc::downgrade(self);

        StreamHandlers {
            on_message: {
                let (weak, token) = (Weak::clone(&weak), token.clone());
                Arc::new(move |event: StreamEvent| {
                    if let Some(inner) = live(&weak, &token) {
                        inner.handle_message(event);
                    }
                })
            },
            on_open: {
                let (weak, token) = (Weak::clone(&weak), token.clone());
                Arc::new(move |response: OpenResponse| -> BoxFuture<'static, Result<()>> {
                    match live(&weak, &token) {
                        Some(inner) => inner.handle_open(response),
                        None => future::ready(Err(Error::transport("stream attempt cancelled")))
                            .boxed(),
                    }
                })
            },
            on_close: {
                let (weak, token) = (Weak::clone(&weak), token.clone());
                Arc::new(move || {
                    if let Some(inner) = live(&weak, &token) {
                        inner.handle_close();
                    }
                })
            },
            on_error: {
                let token = token.clone();
                Arc::new(move |error: Error| {
                    if let Some(inner) = live(&weak, &token) {
                        inner.config.emit_error(error);
                    }
                })
            },
        }
    }

    /// Delivers locally, then fans out to the other tabs.
    fn handle_message(&self, event: StreamEvent) {
        self.config.emit_message(event.clone());

        if let Err(e) = self.channel.post(&event) {
            warn!(url = %self.url, error = %e, "Failed to fan out event");
        }
    }

    fn handle_open(&self, response: OpenResponse) -> BoxFuture<'static, Result<()>> {
        let opened = self.state.send_if_modified(|state| {
            if *state == ConnectionState::Connecting && !self.is_closing() {
                *state = ConnectionState::Open;
                true
            } else {
                false
            }
        });

        if opened {
            info!(url = %self.url, tab_id = %self.tab_id, status = response.status, "Stream open");
        }

        self.config.emit_open(response)
    }

    fn handle_close(&self) {
        debug!(url = %self.url, tab_id = %self.tab_id, "Stream closed by remote");
        self.config.emit_close();
        self.close();
    }
}

/// Upgrades `weak` if the attempt behind `token` is still current.
fn live(weak: &Weak<ConnectionInner>, token: &CancellationToken) -> Option<Arc<ConnectionInner>> {
    if token.is_cancelled() {
        return None;
    }
    weak.upgrade()
}

// ============================================================================
// Subscriber Task
// ============================================================================

/// Forwards broadcast events to `on_message` until the channel closes.
async fn run_subscriber(inner: Arc<ConnectionInner>) {
    while let Some(event) = inner.channel.recv().await {
        trace!(url = %inner.url, tab_id = %inner.tab_id, "Broadcast event received");
        inner.config.emit_message(event);
    }

    trace!(url = %inner.url, tab_id = %inner.tab_id, "Subscriber terminated");
}

// ============================================================================
// Tests
// ============================================================================
