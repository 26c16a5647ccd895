use crate::listener::ListenerId;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Pull-based view of a single listener queue.
///
/// Events arrive in publish order. Dropping the subscription detaches it from
/// the bus on the next publish.
#[derive(Debug)]
pub struct Subscription<E> {
    id: ListenerId,
    receiver: mpsc::UnboundedReceiver<Arc<E>>,
}

impl<E> Subscription<E> {
    pub(crate) const fn new(id: ListenerId, receiver: mpsc::UnboundedReceiver<Arc<E>>) -> Self {
        Self { id, receiver }
    }

    #[must_use]
    pub const fn id(&self) -> ListenerId {
        self.id
    }

    /// Waits for the next event, returning `None` once the bus dropped this queue
    /// and every queued event was consumed.
    pub async fn recv(&mut self) -> Option<Arc<E>> {
        self.receiver.recv().await
    }

    /// Returns the next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<Arc<E>> {
        self.receiver.try_recv().ok()
    }

    /// Number of events waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}
