//! Signal bus for namespaced broadcast.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::channel::{MAX_MESSAGE_SIZE, NamespaceFilter, parse_channel};
use crate::error::{BusError, BusResult};

/// One delivered signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: String,
    pub payload: String,
}

/// Outbound side of a host broadcast primitive.
///
/// When a bus has a sink, `emit` hands messages to it instead of looping them
/// back locally; the host feeds inbound signals through
/// [`SignalBus::deliver`].
pub trait SignalSink: Send + Sync {
    fn send(&self, channel: &str, payload: &str) -> BusResult<()>;
}

impl<F> SignalSink for F
where
    F: Fn(&str, &str) -> BusResult<()> + Send + Sync,
{
    fn send(&self, channel: &str, payload: &str) -> BusResult<()> {
        self(channel, payload)
    }
}

struct Subscriber {
    sender: mpsc::UnboundedSender<Notification>,
    filter: NamespaceFilter,
}

/// Active subscriptions, keyed by generated id.
#[derive(Default)]
struct Registry {
    subscribers: Mutex<HashMap<String, Subscriber>>,
    next_id: AtomicU64,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: &str) {
        if self.lock().remove(id).is_some() {
            debug!(subscriber_id = id, "Unsubscribed");
        }
    }
}

/// Subscription handle for receiving signals.
///
/// Dropping the handle unsubscribes it.
pub struct Subscription {
    id: String,
    receiver: mpsc::UnboundedReceiver<Notification>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Generated subscriber id (`sub_<n>`).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Receive the next matching signal.
    pub async fn recv(&mut self) -> BusResult<Notification> {
        self.receiver.recv().await.ok_or(BusError::Closed)
    }

    /// Receive a signal if one is already queued.
    pub fn try_recv(&mut self) -> BusResult<Option<Notification>> {
        match self.receiver.try_recv() {
            Ok(notification) => Ok(Some(notification)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(BusError::Closed),
        }
    }

    /// Wait for a signal on exactly `channel` and return its payload.
    ///
    /// Signals on other channels of the subscribed namespaces are discarded.
    pub async fn recv_on(&mut self, channel: &str) -> BusResult<String> {
        loop {
            let notification = self.recv().await?;
            if notification.channel == channel {
                return Ok(notification.payload);
            }
            trace!(
                subscriber_id = %self.id,
                expected = channel,
                received = %notification.channel,
                "Skipping signal on other channel"
            );
        }
    }

    /// Stop receiving signals.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(&self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Broadcast bus with a hard per-message size limit.
#[derive(Clone)]
pub struct SignalBus {
    registry: Arc<Registry>,
    max_message_size: usize,
    sink: Option<Arc<dyn SignalSink>>,
}

impl SignalBus {
    /// Loopback bus with the default message limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            max_message_size: MAX_MESSAGE_SIZE,
            sink: None,
        }
    }

    /// Create a new builder.
    #[must_use]
    pub fn builder() -> SignalBusBuilder {
        SignalBusBuilder::new()
    }

    /// Largest payload, in characters, a single signal may carry.
    #[must_use]
    pub const fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Fire a signal.
    ///
    /// Fails without sending anything if the payload is over the limit or the
    /// channel is not a `namespace:local-name` string.
    pub fn emit(&self, channel: &str, payload: &str) -> BusResult<()> {
        let actual = payload.chars().count();
        if actual > self.max_message_size {
            return Err(BusError::message_too_large(actual, self.max_message_size));
        }
        parse_channel(channel)?;

        match &self.sink {
            Some(sink) => sink.send(channel, payload),
            None => {
                self.deliver(channel, payload);
                Ok(())
            }
        }
    }

    /// Hand a signal to every matching subscriber.
    ///
    /// Returns the number of subscribers reached. Subscribers whose receiver
    /// is gone are pruned.
    pub fn deliver(&self, channel: &str, payload: &str) -> usize {
        let mut delivered = 0;
        let mut subscribers = self.registry.lock();

        subscribers.retain(|id, subscriber| {
            if !subscriber.filter.matches(channel) {
                return true;
            }
            let notification = Notification {
                channel: channel.to_owned(),
                payload: payload.to_owned(),
            };
            if subscriber.sender.send(notification).is_ok() {
                delivered += 1;
                true
            } else {
                debug!(subscriber_id = %id, "Pruning closed subscriber");
                false
            }
        });

        trace!(channel, delivered, "Signal delivered");
        delivered
    }

    /// Subscribe to channels matching a namespace filter.
    #[must_use]
    pub fn subscribe(&self, filter: NamespaceFilter) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = format!(
            "sub_{}",
            self.registry.next_id.fetch_add(1, Ordering::Relaxed)
        );

        debug!(subscriber_id = %id, ?filter, "Subscribed");
        self.registry
            .lock()
            .insert(id.clone(), Subscriber { sender, filter });

        Subscription {
            id,
            receiver,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().len()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SignalBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalBus")
            .field("max_message_size", &self.max_message_size)
            .field("subscribers", &self.subscriber_count())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

/// Builder for `SignalBus`.
pub struct SignalBusBuilder {
    max_message_size: usize,
    sink: Option<Arc<dyn SignalSink>>,
}

impl SignalBusBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            sink: None,
        }
    }

    /// Set the per-message limit in characters.
    #[must_use]
    pub const fn with_max_message_size(mut self, max: usize) -> Self {
        self.max_message_size = max;
        self
    }

    /// Send outbound signals to a host sink instead of looping them back.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn SignalSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the bus.
    pub fn build(self) -> BusResult<SignalBus> {
        if self.max_message_size == 0 {
            return Err(BusError::invalid_config(
                "max_message_size must be greater than 0",
            ));
        }

        Ok(SignalBus {
            registry: Arc::new(Registry::default()),
            max_message_size: self.max_message_size,
            sink: self.sink,
        })
    }
}

impl Default for SignalBusBuilder {
    fn default() -> Self {
        Self::new()
    }
}
