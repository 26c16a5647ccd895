//! # Logger
//!
//! Installs the global `tracing` subscriber of a toggle process.
//!
//! The usual entry point is [`Logger::from_config`], which reads the
//! `[logging]` section of the process configuration. [`Logger::builder`]
//! exposes the same settings programmatically; rolling file options only
//! become available once a log directory is set.
//!
//! `RUST_LOG` applies when no `filter` is configured. JSON file output
//! requires the `json` feature.
//!
//! ## Example
//!
//! ```rust,no_run
//! use toggle_domain::config::LoggingConfig;
//! use toggle_logger::Logger;
//!
//! let config = LoggingConfig { level: "debug".to_owned(), ..LoggingConfig::default() };
//! let _logger = Logger::from_config("toggle", &config).unwrap();
//! tracing::info!("ready");
//! ```

mod error;
mod file;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::file::{RollingFile, parse_rotation};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::marker::PhantomData;
use std::path::PathBuf;
use std::str::FromStr;
use toggle_domain::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

mod sealed {
    pub trait Output {}
}

/// Builder stage without file output.
#[derive(Debug)]
pub struct ConsoleOnly;

/// Builder stage with rolling file output.
#[derive(Debug)]
pub struct ToFile;

impl sealed::Output for ConsoleOnly {}
impl sealed::Output for ToFile {}

/// Settings of the global subscriber. Created by [`Logger::builder`].
#[derive(Debug)]
pub struct LoggerBuilder<O: sealed::Output = ConsoleOnly> {
    name: String,
    level: LevelFilter,
    filter: Option<String>,
    console: bool,
    file: Option<RollingFile>,
    output: PhantomData<O>,
}

impl<O: sealed::Output> LoggerBuilder<O> {
    #[must_use = "The logger is only installed by init()"]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// `EnvFilter` directives such as `toggle_engine=debug`. Replaces `RUST_LOG`.
    #[must_use = "The logger is only installed by init()"]
    pub fn filter(mut self, directives: impl Into<String>) -> Self {
        self.filter = Some(directives.into());
        self
    }

    #[must_use = "The logger is only installed by init()"]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Writes log files named after the logger into `directory`.
    #[must_use = "The logger is only installed by init()"]
    pub fn directory(self, directory: impl Into<PathBuf>) -> LoggerBuilder<ToFile> {
        LoggerBuilder {
            name: self.name,
            level: self.level,
            filter: self.filter,
            console: self.console,
            file: Some(RollingFile::new(directory.into())),
            output: PhantomData,
        }
    }

    /// Installs the global subscriber.
    ///
    /// Keep the returned [`Logger`] alive: dropping it stops the background
    /// writer of the log files.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an empty name, a bad
    /// filter, zero kept files, or when neither console nor file output is on.
    /// Returns [`LoggerError::Subscriber`] when a global subscriber is already set.
    pub fn init(self) -> Result<Logger, LoggerError> {
        if self.name.trim().is_empty() {
            return Err(invalid("Logger name cannot be empty", None));
        }
        if !self.console && self.file.is_none() {
            return Err(invalid("Neither console nor file output is enabled", Some("logging.console")));
        }

        let filter = self.env_filter()?;
        let mut layers = Vec::with_capacity(2);
        if self.console {
            layers.push(fmt::layer().compact().with_target(true).boxed());
        }

        let guard = match &self.file {
            Some(file) => {
                let (writer, guard) = file.writer(&self.name)?;
                let layer = fmt::layer().with_writer(writer).with_ansi(false);
                layers.push(if file.json { layer.json().boxed() } else { layer.boxed() });
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;
        tracing::debug!(
            name = %self.name,
            level = %self.level,
            console = self.console,
            directory = ?self.file.as_ref().map(|f| f.directory.display().to_string()),
            "Logging initialized"
        );
        Ok(Logger { guard })
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.filter {
            Some(directives) => builder.parse(directives).map_err(|e| {
                invalid(format!("Invalid filter '{directives}': {e}"), Some("logging.filter"))
            }),
            None => Ok(builder.from_env_lossy()),
        }
    }
}

impl LoggerBuilder<ToFile> {
    #[must_use = "The logger is only installed by init()"]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        if let Some(file) = self.file.as_mut() {
            file.rotation = rotation;
        }
        self
    }

    /// Rotated files kept on disk; older ones are deleted.
    #[must_use = "The logger is only installed by init()"]
    pub fn max_files(mut self, count: usize) -> Self {
        if let Some(file) = self.file.as_mut() {
            file.max_files = count;
        }
        self
    }

    #[cfg(feature = "json")]
    #[must_use = "The logger is only installed by init()"]
    pub fn json(mut self) -> Self {
        if let Some(file) = self.file.as_mut() {
            file.json = true;
        }
        self
    }
}

/// Handle of the installed subscriber.
#[must_use = "Dropping the handle stops file logging"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// `name` prefixes the log files, e.g. `toggle.2026-10-16.log`.
    #[must_use = "The logger is only installed by init()"]
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            level: LevelFilter::INFO,
            filter: None,
            console: true,
            file: None,
            output: PhantomData,
        }
    }

    /// Installs the global subscriber described by a `[logging]` section.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level or
    /// rotation, or when JSON output is requested without the `json` feature.
    /// Every error of [`LoggerBuilder::init`] applies as well.
    pub fn from_config(name: &str, config: &LoggingConfig) -> Result<Self, LoggerError> {
        let level = LevelFilter::from_str(&config.level).map_err(|e| {
            invalid(format!("Invalid level '{}': {e}", config.level), Some("logging.level"))
        })?;

        let mut builder = Self::builder(name).level(level).console(config.console);
        if let Some(directives) = config.filter.as_deref().filter(|f| !f.trim().is_empty()) {
            builder = builder.filter(directives);
        }

        let Some(directory) = &config.directory else {
            return builder.init();
        };
        let builder = builder
            .directory(directory)
            .rotation(parse_rotation(&config.rotation)?)
            .max_files(config.max_files);

        if !config.json {
            return builder.init();
        }
        #[cfg(feature = "json")]
        {
            builder.json().init()
        }
        #[cfg(not(feature = "json"))]
        {
            Err(invalid("JSON output requires the `json` feature", Some("logging.json")))
        }
    }

    /// Whether log files are being written.
    #[must_use]
    pub const fn writes_files(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::debug!("Flushing log files");
        }
    }
}

pub(crate) fn invalid(
    message: impl Into<std::borrow::Cow<'static, str>>,
    key: Option<&'static str>,
) -> LoggerError {
    LoggerError::InvalidConfiguration { message: message.into(), context: key.map(Into::into) }
}
