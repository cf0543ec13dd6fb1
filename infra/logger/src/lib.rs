//! # Logger
//!
//! Tracing setup shared by confhub binaries: a compact console layer, an optional rolling file
//! layer (plain or JSON) written through a non-blocking worker, and an [`EnvFilter`] seeded from
//! the configured level. `RUST_LOG` still wins when no explicit filter is set.
//!
//! The logger can be driven in code through [`Logger::builder`] or from the `[log]` section of
//! an application settings file via [`LogSettings`] and [`Logger::from_settings`].
//!
//! ```rust
//! use confhub_logger::{LevelFilter, Logger};
//!
//! let _logger = Logger::builder()
//!     .name("confhub-demo")
//!     .console(true)
//!     .level(LevelFilter::DEBUG)
//!     .init()
//!     .unwrap();
//! ```

mod error;
mod settings;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use crate::settings::{LogRotation, LogSettings};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 7;
const LOG_FILE_SUFFIX: &str = "log";

#[derive(Debug)]
struct LoggerConfig {
    console: bool,
    directory: Option<PathBuf>,
    level: LevelFilter,
    rotation: Rotation,
    max_files: usize,
    json: bool,
    env_filter: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            directory: None,
            level: LevelFilter::INFO,
            rotation: Rotation::DAILY,
            max_files: DEFAULT_MAX_FILES,
            json: false,
            env_filter: None,
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);
#[derive(Debug)]
pub struct NoFile;
#[derive(Debug)]
pub struct WithFile;

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}
impl Sealed for NoFile {}
impl Sealed for WithFile {}

/// Configures and installs the global tracing subscriber.
///
/// File-only options (`max_files`, `rotation`, `json`) become available once a directory is set.
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName, F: Sealed = NoFile> {
    config: LoggerConfig,
    name: N,
    file: PhantomData<F>,
}

impl<F: Sealed> LoggerBuilder<NoName, F> {
    /// Names the application; the name prefixes rolling log files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName, F> {
        LoggerBuilder { config: self.config, name: WithName(name.into()), file: PhantomData }
    }
}

impl LoggerBuilder<WithName, WithFile> {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.config.max_files = max;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn rotation(mut self, rotation: Rotation) -> Self {
        self.config.rotation = rotation;
        self
    }

    /// Writes file records as JSON lines.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn json(mut self, enabled: bool) -> Self {
        self.config.json = enabled;
        self
    }
}

impl<F: Sealed> LoggerBuilder<WithName, F> {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Sets explicit filter directives (e.g., `confhub_kernel=debug,confhub_storage=warn`).
    ///
    /// Without it the filter is read from `RUST_LOG`. Invalid directives fail
    /// [`LoggerBuilder::init`].
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.env_filter = Some(filter.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    /// Enables rolling file output into `directory`.
    pub fn path(self, directory: impl Into<PathBuf>) -> LoggerBuilder<WithName, WithFile> {
        let mut config = self.config;
        config.directory = Some(directory.into());
        LoggerBuilder { config, name: self.name, file: PhantomData }
    }

    /// Installs the global subscriber.
    ///
    /// The returned [`Logger`] owns the file worker guard and must outlive all logging.
    ///
    /// # Errors
    /// - [`LoggerError::InvalidConfiguration`] for an empty name, zero `max_files`, bad filter
    ///   directives or when neither console nor file output is enabled.
    /// - [`LoggerError::Io`] / [`LoggerError::Appender`] if the log directory cannot be used.
    /// - [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let name = self.name.0;
        validate_config(&self.config, &name)?;
        let filter = build_env_filter(&self.config)?;

        let mut layers = Vec::new();
        if self.config.console {
            layers.push(layer().compact().with_target(true).with_ansi(true).boxed());
        }

        let guard = match self.config.directory {
            Some(directory) => {
                std::fs::create_dir_all(&directory)
                    .context(format!("Failed to create {}", directory.display()))?;

                let appender = RollingFileAppender::builder()
                    .rotation(self.config.rotation)
                    .filename_prefix(&name)
                    .filename_suffix(LOG_FILE_SUFFIX)
                    .max_log_files(self.config.max_files)
                    .build(&directory)
                    .context(format!("Log directory: {}", directory.display()))?;
                let (writer, guard) = tracing_appender::non_blocking(appender);

                let file_layer = layer().with_writer(writer).with_ansi(false);
                layers.push(if self.config.json {
                    file_layer.json().boxed()
                } else {
                    file_layer.boxed()
                });
                Some(guard)
            },
            None => None,
        };

        if layers.is_empty() {
            return Err(LoggerError::invalid("No output enabled, enable console or a log path"));
        }

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;
        tracing::debug!(name = %name, "Logger initialized");

        Ok(Logger { guard })
    }
}

/// Handle to the installed logging system.
///
/// Holds the non-blocking worker guard; dropping it flushes and stops file output.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), name: NoName, file: PhantomData }
    }

    /// Installs the global subscriber described by `settings`.
    ///
    /// # Errors
    /// Same as [`LoggerBuilder::init`], plus [`LoggerError::InvalidConfiguration`] for an
    /// unknown level name.
    pub fn from_settings(name: &str, settings: &LogSettings) -> Result<Self, LoggerError> {
        let level = settings.level_filter()?;

        let mut builder = Self::builder().name(name).level(level).console(settings.console);
        if let Some(filter) = &settings.filter {
            builder = builder.env_filter(filter.clone());
        }

        match &settings.directory {
            Some(directory) => builder
                .path(directory)
                .rotation(settings.rotation.into())
                .max_files(settings.max_files)
                .json(settings.json)
                .init(),
            None => builder.init(),
        }
    }

    /// Returns the file worker guard when file output is enabled.
    #[must_use]
    pub const fn guard(&self) -> Option<&WorkerGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!("Logging system shutting down, flushing buffers...");
        }
    }
}

fn validate_config(config: &LoggerConfig, name: &str) -> Result<(), LoggerError> {
    if name.trim().is_empty() {
        return Err(LoggerError::invalid("Logger name cannot be empty"));
    }
    if config.max_files == 0 {
        return Err(LoggerError::invalid("max_files must be greater than zero"));
    }
    Ok(())
}

fn build_env_filter(config: &LoggerConfig) -> Result<EnvFilter, LoggerError> {
    let builder = EnvFilter::builder().with_default_directive(config.level.into());
    match &config.env_filter {
        Some(filter) => builder
            .parse(filter)
            .map_err(|e| LoggerError::invalid(format!("Invalid filter '{filter}': {e}"))),
        None => Ok(builder.from_env_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_builder_defaults() {
        let builder = Logger::builder().name("confhub-test").env_filter("confhub_kernel=debug");
        assert!(builder.config.console);
        assert_eq!(builder.config.level, LevelFilter::INFO);
        assert_eq!(builder.config.env_filter.as_deref(), Some("confhub_kernel=debug"));
        assert!(builder.config.directory.is_none());
    }

    #[test]
    fn test_file_options_are_recorded() {
        let builder = Logger::builder()
            .name("confhub-test")
            .path("logs")
            .max_files(3)
            .json(true)
            .level(LevelFilter::WARN);

        assert_eq!(builder.config.max_files, 3);
        assert!(builder.config.json);
        assert_eq!(builder.config.level, LevelFilter::WARN);
        assert_eq!(builder.config.directory.as_deref(), Some(std::path::Path::new("logs")));
    }

    #[test]
    fn test_invalid_configuration_is_rejected_before_install() {
        let err = Logger::builder().name("  ").init().unwrap_err();
        assert_eq!(err.kind(), "InvalidConfiguration");

        let err = Logger::builder().name("confhub-test").console(false).init().unwrap_err();
        assert_eq!(err.kind(), "InvalidConfiguration");

        let err =
            Logger::builder().name("confhub-test").env_filter("confhub=loudest").init().unwrap_err();
        assert_eq!(err.kind(), "InvalidConfiguration");

        let err =
            Logger::builder().name("confhub-test").path("logs").max_files(0).init().unwrap_err();
        assert_eq!(err.kind(), "InvalidConfiguration");
    }

    #[test]
    #[serial]
    fn test_file_logging_setup() -> Result<(), Box<dyn std::error::Error>> {
        let tmp = tempdir()?;
        let log_dir = tmp.path().join("logs");

        let logger = Logger::builder().name("confhub-test").console(false).path(&log_dir).init()?;
        tracing::info!("hello world");
        std::thread::sleep(Duration::from_millis(20));
        drop(logger);

        let has_log = std::fs::read_dir(&log_dir)?
            .flatten()
            .any(|entry| entry.path().extension().and_then(|e| e.to_str()) == Some("log"));
        assert!(has_log, "at least one log file should be created");
        Ok(())
    }
}
