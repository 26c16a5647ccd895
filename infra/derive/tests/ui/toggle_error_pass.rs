use std::borrow::Cow;
use toggle_derive::toggle_error;

#[toggle_error]
pub enum LookupError {
    #[error("Lookup failed{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Missing entry{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<(), std::io::Error> {
    Err(std::io::Error::other("disk"))
}

fn main() {
    let err = read().context("reading definitions").unwrap_err();
    assert_eq!(err.code(), "io");
    assert!(err.to_string().contains("(reading definitions)"));

    let err: LookupError = "boom".into();
    assert_eq!(err.code(), "internal");

    let missing: Result<(), LookupError> =
        Err(LookupError::NotFound { message: "flag".into(), context: None });
    let err = missing.context("resolver").unwrap_err();
    assert_eq!(err.code(), "not_found");
    assert_eq!(err.to_string(), "Missing entry (resolver): flag");
}
