use crate::error::LoggerError;
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::Rotation;

/// Log file rotation cadence as written in settings files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<LogRotation> for Rotation {
    fn from(value: LogRotation) -> Self {
        match value {
            LogRotation::Minutely => Self::MINUTELY,
            LogRotation::Hourly => Self::HOURLY,
            LogRotation::Daily => Self::DAILY,
            LogRotation::Never => Self::NEVER,
        }
    }
}

/// The `[log]` section of an application settings file.
///
/// ```toml
/// [log]
/// level = "debug"
/// directory = "logs"
/// json = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `trace`, `debug`, `info`, `warn`, `error` or `off`.
    pub level: String,
    pub console: bool,
    /// Enables rolling file output when set.
    pub directory: Option<PathBuf>,
    pub json: bool,
    /// Filter directives overriding `RUST_LOG`.
    pub filter: Option<String>,
    pub rotation: LogRotation,
    pub max_files: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            console: true,
            directory: None,
            json: false,
            filter: None,
            rotation: LogRotation::Daily,
            max_files: crate::DEFAULT_MAX_FILES,
        }
    }
}

impl LogSettings {
    /// Parses [`LogSettings::level`].
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an unknown level name.
    pub fn level_filter(&self) -> Result<LevelFilter, LoggerError> {
        LevelFilter::from_str(self.level.trim())
            .map_err(|e| LoggerError::invalid(format!("Unknown log level '{}': {e}", self.level)))
    }
}
