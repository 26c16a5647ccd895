use crate::{LoggerError, invalid};
use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};

const SUFFIX: &str = "log";
const DEFAULT_MAX_FILES: usize = 10;

/// Rolling log file output.
#[derive(Debug, Clone)]
pub struct RollingFile {
    pub(crate) directory: PathBuf,
    pub(crate) rotation: Rotation,
    pub(crate) max_files: usize,
    pub(crate) json: bool,
}

impl RollingFile {
    pub(crate) const fn new(directory: PathBuf) -> Self {
        Self { directory, rotation: Rotation::DAILY, max_files: DEFAULT_MAX_FILES, json: false }
    }

    /// Creates the directory and a non-blocking writer for `<name>[.<period>].log` files.
    pub(crate) fn writer(&self, name: &str) -> Result<(NonBlocking, WorkerGuard), LoggerError> {
        if self.max_files == 0 {
            return Err(invalid("At least one log file must be kept", Some("logging.max_files")));
        }
        fs::create_dir_all(&self.directory).map_err(|e| LoggerError::Internal {
            message: e.to_string().into(),
            context: Some(format!("creating {}", self.directory.display()).into()),
        })?;

        let appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(name)
            .filename_suffix(SUFFIX)
            .max_log_files(self.max_files)
            .build(&self.directory)?;
        Ok(tracing_appender::non_blocking(appender))
    }
}

/// Parses a rotation period name, ignoring case.
///
/// # Errors
/// Returns [`LoggerError::InvalidConfiguration`] for anything but
/// `minutely`, `hourly`, `daily` or `never`.
pub fn parse_rotation(period: &str) -> Result<Rotation, LoggerError> {
    match period.trim().to_ascii_lowercase().as_str() {
        "minutely" => Ok(Rotation::MINUTELY),
        "hourly" => Ok(Rotation::HOURLY),
        "daily" => Ok(Rotation::DAILY),
        "never" => Ok(Rotation::NEVER),
        other => Err(invalid(format!("Unknown rotation '{other}'"), Some("logging.rotation"))),
    }
}

#[cfg(test)]
mod tests {
    use super::{Rotation, parse_rotation};

    #[test]
    fn rotation_names_are_case_insensitive() {
        assert_eq!(parse_rotation("Daily").unwrap(), Rotation::DAILY);
        assert_eq!(parse_rotation(" never ").unwrap(), Rotation::NEVER);
        assert_eq!(parse_rotation("HOURLY").unwrap(), Rotation::HOURLY);

        let err = parse_rotation("weekly").unwrap_err();
        assert_eq!(err.code(), "invalid_configuration");
        assert!(err.to_string().contains("logging.rotation"));
    }
}
