use std::borrow::Cow;

/// Errors that can occur during notification bus operations.
#[toggle_derive::toggle_error]
pub enum EventBusError {
    /// A listener task was requested outside of a tokio runtime.
    #[error("Runtime unavailable{}: {message}", format_context(.context))]
    RuntimeUnavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
