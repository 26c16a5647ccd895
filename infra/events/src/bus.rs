use crate::error::EventBusError;
use crate::listener::{Listener, ListenerId};
use crate::subscription::Subscription;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{error, trace, warn};

/// Marker trait for types that can be sent across the [`NotificationBus`].
///
/// Any type that is `Send + Sync + 'static` automatically implements this trait.
pub trait Event: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Event for T {}

struct Inner<E> {
    queues: RwLock<FxHashMap<ListenerId, mpsc::UnboundedSender<Arc<E>>>>,
    next_id: AtomicU64,
}

/// Asynchronous, order-preserving notification bus.
///
/// Every listener owns an unbounded FIFO queue, so [`NotificationBus::publish`]
/// never waits for delivery and never drops an event for a live listener.
/// Callback listeners are driven by a dedicated task on the tokio runtime that
/// was current at subscription time.
pub struct NotificationBus<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for NotificationBus<E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E> Default for NotificationBus<E> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Inner {
                queues: RwLock::new(FxHashMap::default()),
                next_id: AtomicU64::new(1),
            }),
        }
    }
}

impl<E> fmt::Debug for NotificationBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("event", &std::any::type_name::<E>())
            .field("listeners", &self.inner.queues.read().len())
            .finish()
    }
}

impl<E: Event> NotificationBus<E> {
    /// Creates a new bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a callback listener.
    ///
    /// # Errors
    /// Returns [`EventBusError::RuntimeUnavailable`] when called outside a tokio runtime.
    ///
    /// # Examples
    /// ```rust
    /// use toggle_event_bus::{ListenerError, NotificationBus};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), toggle_event_bus::EventBusError> {
    /// let bus = NotificationBus::<u64>::new();
    /// let id = bus.subscribe(|value: &u64| -> Result<(), ListenerError> {
    ///     if *value == 0 { Err("zero".into()) } else { Ok(()) }
    /// })?;
    /// bus.publish(7);
    /// assert!(bus.unsubscribe(id));
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe<L: Listener<E>>(&self, listener: L) -> Result<ListenerId, EventBusError> {
        let handle = Handle::try_current().map_err(|err| EventBusError::RuntimeUnavailable {
            message: err.to_string().into(),
            context: Some(std::any::type_name::<E>().into()),
        })?;

        let (id, mut receiver) = self.attach();
        handle.spawn(async move {
            while let Some(event) = receiver.recv().await {
                deliver(id, &listener, event.as_ref());
            }
            trace!(%id, event = std::any::type_name::<E>(), "Listener queue closed");
        });

        Ok(id)
    }

    /// Registers a pull-based listener.
    ///
    /// # Examples
    /// ```rust
    /// use toggle_event_bus::NotificationBus;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let bus = NotificationBus::<&'static str>::new();
    /// let mut sub = bus.subscribe_channel();
    /// bus.publish("updated");
    /// assert_eq!(*sub.recv().await.unwrap(), "updated");
    /// # }
    /// ```
    #[must_use]
    pub fn subscribe_channel(&self) -> Subscription<E> {
        let (id, receiver) = self.attach();
        Subscription::new(id, receiver)
    }

    /// Detaches a listener. Events already queued for it are still delivered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let removed = self.inner.queues.write().remove(&id).is_some();
        if removed {
            trace!(%id, event = std::any::type_name::<E>(), "Listener unsubscribed");
        }
        removed
    }

    /// Publishes an event to every listener and returns how many queues accepted it.
    pub fn publish(&self, event: E) -> usize {
        self.publish_arc(Arc::new(event))
    }

    /// Publishes a shared event instance without re-wrapping.
    pub fn publish_arc(&self, event: Arc<E>) -> usize {
        let mut closed = Vec::new();
        let delivered = {
            let queues = self.inner.queues.read();
            let mut delivered = 0;
            for (id, queue) in queues.iter() {
                if queue.send(Arc::clone(&event)).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*id);
                }
            }
            delivered
        };

        if !closed.is_empty() {
            let mut queues = self.inner.queues.write();
            for id in &closed {
                queues.remove(id);
            }
            trace!(count = closed.len(), "Pruned closed listener queues");
        }

        if delivered == 0 {
            trace!(event = std::any::type_name::<E>(), "Event dropped: no active listeners");
        } else {
            trace!(event = std::any::type_name::<E>(), delivered, "Event dispatched");
        }
        delivered
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.queues.read().len()
    }

    /// Closes every listener queue.
    ///
    /// Returns the number of listeners that were detached.
    #[must_use]
    pub fn shutdown(&self) -> usize {
        let mut queues = self.inner.queues.write();
        let count = queues.len();
        queues.clear();
        count
    }

    fn attach(&self) -> (ListenerId, mpsc::UnboundedReceiver<Arc<E>>) {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (sender, receiver) = mpsc::unbounded_channel();
        self.inner.queues.write().insert(id, sender);
        trace!(%id, event = std::any::type_name::<E>(), "Listener subscribed");
        (id, receiver)
    }
}

fn deliver<E, L: Listener<E>>(id: ListenerId, listener: &L, event: &E) {
    match catch_unwind(AssertUnwindSafe(|| listener.on_event(event))) {
        Ok(Ok(())) => {},
        Ok(Err(err)) => {
            warn!(%id, error.code = err.code(), error = %err, "Listener failed to handle event");
        },
        Err(panic) => {
            error!(%id, panic = panic_message(panic.as_ref()), "Listener panicked while handling event");
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
