#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the toggle workspace.
//!
//! The only macro here is [`macro@toggle_error`], which every crate uses to declare its
//! error enum with a uniform shape: `thiserror` display, optional context, `?`-friendly
//! conversions from upstream errors, and a stable machine-readable code per variant.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Declares a crate error enum.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` unless already derived.
/// * `<Name>Ext` trait with `.context(...)` for `Result<T, Name>` and for
///   `Result<T, Source>` of every variant that wraps an upstream error.
/// * `From<Source>` for every variant with a `source` field (or a field marked
///   `#[source]` / `#[from]`).
/// * `From<&'static str>` and `From<String>` when an `Internal` variant exists.
/// * `fn code(&self) -> &'static str`, the `snake_case` variant name, meant for the
///   `error.code` field of structured log events.
/// * A module-private `format_context` helper for `#[error(...)]` strings.
///
/// # Requirements
///
/// 1. Only enums are accepted, with named-field variants.
/// 2. A variant with a source must also carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[toggle_derive::toggle_error]
/// pub enum RegistryError {
///     #[error("Invalid definition{}: {message}", format_context(.context))]
///     Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Bad pattern{}: {source}", format_context(.context))]
///     Pattern { source: regex::Error, context: Option<Cow<'static, str>> },
/// }
///
/// let err = RegistryError::Validation { message: "empty name".into(), context: None };
/// assert_eq!(err.code(), "validation");
/// ```
#[proc_macro_attribute]
pub fn toggle_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).into()
}
