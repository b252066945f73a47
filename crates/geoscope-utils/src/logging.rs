//! # Logging Utilities
//!
//! Logging infrastructure for geoscope using `tracing`.
//!
//! Console output goes to stderr so that stdout stays reserved for the
//! JSON documents the CLI prints. Supported:
//! - Multiple output formats (JSON for tooling, pretty for humans)
//! - Environment variable configuration
//! - Log level filtering with `RUST_LOG` directives
//! - An optional date-prefixed log file next to console output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geoscope_utils::init_logging;
//!
//! // Initialize with default settings (reads from RUST_LOG env var)
//! init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=geoscope_core=trace`)
//! - `GEOSCOPE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `GEOSCOPE_LOG_FILE`: Optional log file; the current date is prefixed to its name
//!
//! ## Examples
//!
//! ```rust,no_run
//! use geoscope_utils::{LogFormat, LogLevel, init_logging_with_level};
//!
//! init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
//!     .expect("Failed to initialize logging");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::{env, fmt, fs, io};

use chrono::{NaiveDate, Utc};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "GEOSCOPE_LOG_FORMAT";

/// Environment variable naming the log file.
pub const LOG_FILE_ENV: &str = "GEOSCOPE_LOG_FILE";

// Flushes the file writer when the process exits.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default)
    Pretty,
    /// JSON format, one object per line
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level
    Warn,
    /// Info level (default)
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl fmt::Display for LogLevel
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", Level::from(*self))
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `geoscope_core=trace`)
/// - `GEOSCOPE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `GEOSCOPE_LOG_FILE`: Optional path to a log file
///
/// ## Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - `GEOSCOPE_LOG_FORMAT` or `RUST_LOG` holds an invalid value
/// - The log file cannot be created
pub fn init_logging() -> Result<(), LoggingError>
{
    let format = match env::var(LOG_FORMAT_ENV) {
        Ok(value) => LogFormat::from_str(&value).map_err(LoggingError::InvalidFormat)?,
        Err(_) => LogFormat::Pretty,
    };

    // RUST_LOG may hold per-module directives, not just a level
    let filter = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => EnvFilter::try_new(&directives).map_err(|err| LoggingError::InvalidLevel(err.to_string()))?,
        Err(_) => EnvFilter::new(Level::INFO.to_string()),
    };

    init_logging_internal(format, filter)
}

/// Initialize logging with explicit level and format
///
/// An explicit level (the CLI's `--log-level`) takes precedence over `RUST_LOG`.
///
/// ## Example
///
/// ```rust,no_run
/// use geoscope_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// init_logging_with_level(LogLevel::Debug, LogFormat::Json)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized or file logging fails.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<(), LoggingError>
{
    init_logging_internal(format, EnvFilter::new(level.to_string()))
}

/// Log file path for `path` on `date`: the date is prefixed to the file name.
///
/// ```rust
/// use std::path::Path;
///
/// use chrono::NaiveDate;
/// use geoscope_utils::logging::dated_log_path;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
/// let path = dated_log_path(Path::new("logs/geoscope.log"), date);
/// assert_eq!(path, Path::new("logs/2024-03-09-geoscope.log"));
/// ```
#[must_use]
pub fn dated_log_path(path: &Path, date: NaiveDate) -> PathBuf
{
    let name = path.file_name().map_or_else(|| "geoscope.log".into(), |name| name.to_string_lossy());
    path.with_file_name(format!("{}-{name}", date.format("%Y-%m-%d")))
}

fn init_logging_internal(format: LogFormat, filter: EnvFilter) -> Result<(), LoggingError>
{
    let mut layers: Vec<BoxedLayer> = vec![console_layer(format)];

    if let Some(file) = env::var_os(LOG_FILE_ENV).map(PathBuf::from) {
        let path = dated_log_path(&file, Utc::now().date_naive());
        let (writer, guard) = file_writer(&path)?;
        layers.push(file_layer(format, writer));
        // a second initialization fails below; its guard is dropped with it
        let _ = FILE_GUARD.set(guard);
    }

    Registry::default()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|err| LoggingError::InitializationFailed(err.to_string()))
}

fn console_layer(format: LogFormat) -> BoxedLayer
{
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(io::stderr);

    match format {
        LogFormat::Pretty => layer.with_ansi(true).boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

fn file_layer(format: LogFormat, writer: NonBlocking) -> BoxedLayer
{
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(writer);

    match format {
        LogFormat::Pretty => layer.with_ansi(false).boxed(), // No ANSI in files
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), LoggingError>
{
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&directory)?;

    let file_name = path.file_name().unwrap_or_default();
    // rolling::never since the date is already part of the file name
    let appender = tracing_appender::rolling::never(&directory, file_name);
    Ok(tracing_appender::non_blocking(appender))
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level or filter directive
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// File logging error
    #[error("File logging error: {0}")]
    FileError(#[from] io::Error),
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_log_format_from_str()
    {
        assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::from_str("dev").unwrap(), LogFormat::Pretty);
        assert_eq!(LogFormat::from_str("prod").unwrap(), LogFormat::Json);
        assert!(LogFormat::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_from_str()
    {
        assert_eq!(LogLevel::from_str("error").unwrap(), LogLevel::Error);
        assert_eq!(LogLevel::from_str("WARNING").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::from_str("info").unwrap(), LogLevel::Info);
        assert_eq!(LogLevel::from_str("dbg").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::from_str("trace").unwrap(), LogLevel::Trace);
        assert!(LogLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_log_level_to_tracing_level()
    {
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Debug), Level::DEBUG);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_log_level_display_is_a_filter_directive()
    {
        assert_eq!(LogLevel::Warn.to_string(), "WARN");
        assert!(EnvFilter::try_new(LogLevel::Debug.to_string()).is_ok());
    }

    #[test]
    fn test_dated_log_path_without_directory()
    {
        let date = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(dated_log_path(Path::new("run.log"), date), PathBuf::from("2025-12-31-run.log"));
    }
}
