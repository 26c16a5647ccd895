use std::borrow::Cow;
use std::fmt;

/// Failure reported by a [`Listener`] for a single event.
///
/// A failing listener keeps receiving subsequent events.
#[toggle_derive::toggle_error]
pub enum ListenerError {
    #[error("Listener rejected event{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Receiver side of the bus.
///
/// Implemented for every `Fn(&E) -> Result<(), ListenerError>` closure.
pub trait Listener<E>: Send + Sync + 'static {
    fn on_event(&self, event: &E) -> Result<(), ListenerError>;
}

impl<E, F> Listener<E> for F
where
    F: Fn(&E) -> Result<(), ListenerError> + Send + Sync + 'static,
{
    fn on_event(&self, event: &E) -> Result<(), ListenerError> {
        self(event)
    }
}

/// Opaque handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}
