use std::borrow::Cow;
use toggle_event_bus::EventBusError;

/// Errors surfaced by registration, management and bootstrap operations.
///
/// Query operations never fail: unknown names resolve to an absent result.
#[toggle_derive::toggle_error]
pub enum ToggleError {
    /// A definition was rejected at construction time.
    #[error("Validation failed{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A strategy pattern is not a valid regular expression.
    #[error("Invalid pattern{}: {source}", format_context(.context))]
    Pattern { source: regex::Error, context: Option<Cow<'static, str>> },

    /// A management call referenced a name or id that is not registered.
    #[error("Not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A definitions document could not be parsed.
    #[error("Malformed definitions{}: {source}", format_context(.context))]
    Definitions { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// A definitions document could not be read.
    #[error("I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Event bus error{}: {source}", format_context(.context))]
    EventBus { source: EventBusError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ToggleError {
    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    pub(crate) fn not_found(kind: &'static str, what: impl std::fmt::Display) -> Self {
        Self::NotFound { message: format!("{kind} '{what}'").into(), context: None }
    }
}
