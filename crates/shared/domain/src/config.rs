use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

use crate::constants::{DEFAULT_LOG_FILES, DEFAULT_LOG_ROTATION, DEFAULT_SOURCE};

/// Top-level configuration of a toggle process.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToggleConfigInner {
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ToggleConfig {
    #[serde(flatten, default)]
    inner: Arc<ToggleConfigInner>,
}

impl Deref for ToggleConfig {
    type Target = ToggleConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ToggleConfig {
    fn deref_mut(&mut self) -> &mut ToggleConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Feature service bootstrap settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name under which bootstrap definitions are registered and later unloaded.
    pub source: String,
    /// JSON document with `features`, `groups` and `strategies`.
    pub definitions: Option<PathBuf>,
}

/// Tracing subscriber settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `EnvFilter` directive such as `toggle_engine=debug`.
    pub filter: Option<String>,
    /// Rolling file output is enabled when set.
    pub directory: Option<PathBuf>,
    /// `minutely`, `hourly`, `daily` or `never`; applies to file output only.
    pub rotation: String,
    /// Rotated files kept in `directory`, the current one included.
    pub max_files: usize,
    /// Structured JSON lines in the log files.
    pub json: bool,
    pub console: bool,
}

// --- Default ---

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { source: DEFAULT_SOURCE.to_owned(), definitions: None }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            filter: None,
            directory: None,
            rotation: DEFAULT_LOG_ROTATION.to_owned(),
            max_files: DEFAULT_LOG_FILES,
            json: false,
            console: true,
        }
    }
}
