//! # Notification Bus
//!
//! Asynchronous, order-preserving delivery of change notifications.
//!
//! ## Overview
//!
//! A [`NotificationBus`] fans every published event out to per-listener FIFO
//! queues. Publishing returns immediately; each callback listener is served by
//! its own task, so a slow or failing listener never delays the publisher or
//! any other listener.
//!
//! ## Guarantees
//!
//! * **Per-listener order**: a listener observes events in publish order.
//! * **Isolation**: listener errors are logged with `warn!`, panics are caught
//!   and logged with `error!`; delivery continues with the next event.
//! * **Non-blocking publish**: queues are unbounded.
//!
//! # Example
//!
//! ```rust
//! use toggle_event_bus::{EventBusError, NotificationBus};
//!
//! #[derive(Debug, PartialEq)]
//! enum Change { Updated(&'static str), Deleted(&'static str) }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), EventBusError> {
//!     let bus = NotificationBus::new();
//!     let mut sub = bus.subscribe_channel();
//!
//!     bus.publish(Change::Updated("checkout"));
//!     bus.publish(Change::Deleted("checkout"));
//!
//!     assert_eq!(*sub.recv().await.unwrap(), Change::Updated("checkout"));
//!     assert_eq!(*sub.recv().await.unwrap(), Change::Deleted("checkout"));
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod listener;
mod subscription;

pub use bus::{Event, NotificationBus};
pub use error::{EventBusError, EventBusErrorExt};
pub use listener::{Listener, ListenerError, ListenerErrorExt, ListenerId};
pub use subscription::Subscription;
