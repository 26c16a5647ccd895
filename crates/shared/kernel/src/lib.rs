//! Kernel utilities shared across the toggle crates.
//! Keep this crate lightweight; it re-exports the domain types and the layered config loader.
//!
//! ## Config loading
//! ```rust,no_run
//! use toggle_kernel::config::load_config;
//! use toggle_kernel::domain::config::ToggleConfig;
//!
//! let cfg: ToggleConfig = load_config(Some("toggle.toml")).unwrap_or_default();
//! assert!(!cfg.service.source.is_empty());
//! ```
pub mod config;

pub use toggle_domain as domain;
