//! Named publish/subscribe channels shared by every tab of an origin.
//!
//! The leader republishes each stream event on the channel for its URL;
//! every other subscriber of that name receives it. A subscriber never
//! receives its own posts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  post   ┌───────────────────────┐  recv  ┌──────────────┐
//! │ Tab A        │────────►│ LocalBroadcastHub     │───────►│ Tab B        │
//! │ (leader)     │         │  name → [queue, ...]  │───────►│ Tab C        │
//! └──────────────┘         └───────────────────────┘        └──────────────┘
//! ```
//!
//! Events cross the hub JSON-encoded, the same way a structured clone
//! crosses tab boundaries. Each subscription owns an unbounded queue, so
//! delivery never drops events; closing a subscription removes its queue.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::SubscriptionId;
use crate::protocol::StreamEvent;

// ============================================================================
// Traits
// ============================================================================

/// One subscription to a named broadcast channel.
#[async_trait]
pub trait BroadcastChannel: Send + Sync {
    /// Returns the channel name.
    fn name(&self) -> &str;

    /// Publishes `event` to every other subscriber of this name.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelClosed`] if this subscription was closed
    /// - [`Error::Json`] if the event cannot be encoded
    fn post(&self, event: &StreamEvent) -> Result<()>;

    /// Waits for the next event posted by another subscriber.
    ///
    /// Returns `None` once the subscription is closed.
    async fn recv(&self) -> Option<StreamEvent>;

    /// Closes the subscription. Idempotent.
    fn close(&self);

    /// Returns `true` once [`close`](Self::close) has been called.
    fn is_closed(&self) -> bool;
}

/// Host-provided factory of broadcast channel subscriptions.
pub trait BroadcastHub: Send + Sync {
    /// Subscribes to the channel called `name`.
    ///
    /// # Errors
    ///
    /// Implementations may fail if the host refuses the subscription.
    fn open(&self, name: &str) -> Result<Arc<dyn BroadcastChannel>>;
}

// ============================================================================
// Types
// ============================================================================

/// Subscriptions by channel name.
type Subscribers = Arc<Mutex<FxHashMap<String, Vec<Subscriber>>>>;

/// Delivery end of one subscription.
struct Subscriber {
    /// Subscription id, used to skip the poster.
    id: SubscriptionId,
    /// JSON-encoded [`StreamEvent`]s.
    tx: mpsc::UnboundedSender<Arc<str>>,
}

// ============================================================================
// LocalBroadcastHub
// ============================================================================

/// In-process broadcast hub.
///
/// Every tab created from the same [`Origin`](crate::Origin) shares one
/// instance. Each subscription has its own unbounded queue, so a slow
/// subscriber never misses events.
#[derive(Default)]
pub struct LocalBroadcastHub {
    /// Live subscriptions by channel name.
    subscribers: Subscribers,
}

impl LocalBroadcastHub {
    /// Creates a hub with no channels.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of live subscriptions on `name`.
    #[must_use]
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.subscribers.lock().get(name).map_or(0, Vec::len)
    }
}

impl fmt::Debug for LocalBroadcastHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBroadcastHub")
            .field("channels", &self.subscribers.lock().len())
            .finish()
    }
}

impl BroadcastHub for LocalBroadcastHub {
    fn open(&self, name: &str) -> Result<Arc<dyn BroadcastChannel>> {
        let id = SubscriptionId::generate();
        let (tx, rx) = mpsc::unbounded_channel();

        self.subscribers
            .lock()
            .entry(name.to_string())
            .or_default()
            .push(Subscriber { id, tx });

        let channel = LocalChannel {
            id,
            name: name.to_string(),
            subscribers: Arc::clone(&self.subscribers),
            rx: tokio::sync::Mutex::new(rx),
            closed: CancellationToken::new(),
        };

        debug!(name, id = %channel.id, "Broadcast channel opened");
        Ok(Arc::new(channel))
    }
}

// ============================================================================
// LocalChannel
// ============================================================================

/// Subscription handed out by [`LocalBroadcastHub`].
struct LocalChannel {
    /// This subscription's id.
    id: SubscriptionId,
    /// Channel name.
    name: String,
    /// The hub's subscription table.
    subscribers: Subscribers,
    /// This subscription's queue.
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<Arc<str>>>,
    /// Fired on close.
    closed: CancellationToken,
}

impl LocalChannel {
    /// Removes this subscription from the hub.
    fn unsubscribe(&self) {
        let mut subscribers = self.subscribers.lock();
        if let Some(list) = subscribers.get_mut(&self.name) {
            list.retain(|subscriber| subscriber.id != self.id);
            if list.is_empty() {
                subscribers.remove(&self.name);
            }
        }
    }
}

impl Drop for LocalChannel {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

#[async_trait]
impl BroadcastChannel for LocalChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn post(&self, event: &StreamEvent) -> Result<()> {
        if self.closed.is_cancelled() {
            return Err(Error::channel_closed(&self.name));
        }

        let payload: Arc<str> = serde_json::to_string(event)?.into();

        let mut peers = 0usize;
        if let Some(list) = self.subscribers.lock().get(&self.name) {
            for subscriber in list.iter().filter(|subscriber| subscriber.id != self.id) {
                // A failed send means the peer is being dropped right now.
                if subscriber.tx.send(Arc::clone(&payload)).is_ok() {
                    peers += 1;
                }
            }
        }

        trace!(name = %self.name, peers, "Event posted");
        Ok(())
    }

    async fn recv(&self) -> Option<StreamEvent> {
        let mut rx = tokio::select! {
            _ = self.closed.cancelled() => return None,
            rx = self.rx.lock() => rx,
        };

        loop {
            let payload = tokio::select! {
                biased;
                _ = self.closed.cancelled() => return None,
                received = rx.recv() => received?,
            };

            match serde_json::from_str(&payload) {
                Ok(event) => return Some(event),
                Err(e) => {
                    warn!(name = %self.name, error = %e, "Dropping undecodable broadcast");
                }
            }
        }
    }

    fn close(&self) {
        if !self.closed.is_cancelled() {
            self.closed.cancel();
            self.unsubscribe();
            debug!(name = %self.name, id = %self.id, "Broadcast channel closed");
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::time::timeout;

    #[tokio::test]
    async fn test_post_reaches_other_subscribers() {
        let hub = LocalBroadcastHub::new();
        let a = hub.open("news").unwrap();
        let b = hub.open("news").unwrap();
        let c = hub.open("news").unwrap();

        let event = StreamEvent::data("hello").with_id("1");
        a.post(&event).unwrap();

        assert_eq!(b.recv().await, Some(event.clone()));
        assert_eq!(c.recv().await, Some(event));
    }

    #[tokio::test]
    async fn test_sender_does_not_receive_own_post() {
        let hub = LocalBroadcastHub::new();
        let a = hub.open("news").unwrap();
        let b = hub.open("news").unwrap();

        a.post(&StreamEvent::data("mine")).unwrap();
        b.post(&StreamEvent::data("theirs")).unwrap();

        assert_eq!(a.recv().await, Some(StreamEvent::data("theirs")));
    }

    #[tokio::test]
    async fn test_names_are_isolated() {
        let hub = LocalBroadcastHub::new();
        let a = hub.open("one").unwrap();
        let b = hub.open("two").unwrap();

        a.post(&StreamEvent::data("x")).unwrap();
        let received = timeout(Duration::from_millis(50), b.recv()).await;
        assert!(received.is_err());
    }

    #[tokio::test]
    async fn test_close_ends_recv_and_rejects_post() {
        let hub = LocalBroadcastHub::new();
        let a = hub.open("news").unwrap();

        a.close();
        a.close();

        assert!(a.is_closed());
        assert_eq!(a.recv().await, None);
        assert!(matches!(
            a.post(&StreamEvent::data("late")),
            Err(Error::ChannelClosed { .. })
        ));
    }

    #[tokio::test]
    async fn test_burst_is_delivered_in_full() {
        let hub = LocalBroadcastHub::new();
        let a = hub.open("news").unwrap();
        let b = hub.open("news").unwrap();

        for i in 0..1000 {
            a.post(&StreamEvent::data(i.to_string())).unwrap();
        }

        for i in 0..1000 {
            assert_eq!(b.recv().await, Some(StreamEvent::data(i.to_string())));
        }
    }

    #[test]
    fn test_subscriber_count() {
        let hub = LocalBroadcastHub::new();
        assert_eq!(hub.subscriber_count("news"), 0);
        let _a = hub.open("news").unwrap();
        let _b = hub.open("news").unwrap();
        assert_eq!(hub.subscriber_count("news"), 2);
    }

    #[test]
    fn test_close_and_drop_unsubscribe() {
        let hub = LocalBroadcastHub::new();
        let a = hub.open("news").unwrap();
        let b = hub.open("news").unwrap();
        let c = hub.open("news").unwrap();

        a.close();
        assert_eq!(hub.subscriber_count("news"), 2);
        a.close();
        assert_eq!(hub.subscriber_count("news"), 2);

        drop(b);
        assert_eq!(hub.subscriber_count("news"), 1);

        c.close();
        assert_eq!(hub.subscriber_count("news"), 0);
    }

    #[tokio::test]
    async fn test_closed_subscriber_receives_nothing() {
        let hub = LocalBroadcastHub::new();
        let a = hub.open("news").unwrap();
        let b = hub.open("news").unwrap();

        b.close();
        a.post(&StreamEvent::data("after close")).unwrap();
        assert_eq!(b.recv().await, None);
    }
}
