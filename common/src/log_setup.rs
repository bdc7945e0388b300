use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, Rotation};
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum LogSetupError {
    #[error("Invalid log filter '{filter}': {source}")]
    Filter { filter: String, source: ParseError },
    #[error("Failed to create log directory '{path}': {source}")]
    Directory { path: PathBuf, source: io::Error },
    #[error("Failed to create log file appender: {0}")]
    Appender(#[from] InitError),
    #[error("Logging already initialized")]
    AlreadyInitialized,
}

/// Where and how much to log.
#[derive(Debug, Clone, Copy)]
pub struct LogConfig<'a> {
    /// Filter directives used when `RUST_LOG` is not set, e.g. `info`.
    pub filter: &'a str,
    pub dir: &'a Path,
    /// Log files are named `<prefix>.<date>.log`.
    pub prefix: &'a str,
    /// Rotated files kept on disk.
    pub max_files: usize,
}

impl<'a> LogConfig<'a> {
    pub fn new(filter: &'a str, dir: &'a Path, prefix: &'a str) -> Self {
        Self {
            filter,
            dir,
            prefix,
            max_files: 5,
        }
    }

    fn env_filter(&self) -> Result<EnvFilter, LogSetupError> {
        EnvFilter::try_from_default_env().or_else(|_| {
            EnvFilter::try_new(self.filter).map_err(|source| LogSetupError::Filter {
                filter: self.filter.to_string(),
                source,
            })
        })
    }
}

/// Installs stderr and daily-rolling file logging for the process.
///
/// Console output goes to stderr so stdout stays free for interactive prompts.
pub fn setup_logging(config: &LogConfig<'_>) -> Result<(), LogSetupError> {
    let env_filter = config.env_filter()?;

    std::fs::create_dir_all(config.dir).map_err(|source| LogSetupError::Directory {
        path: config.dir.to_path_buf(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix(config.prefix)
        .filename_suffix("log")
        .max_log_files(config.max_files)
        .build(config.dir)?;
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(true)
        .with_writer(io::stderr);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LogSetupError::AlreadyInitialized)?;

    LOG_GUARD
        .set(guard)
        .map_err(|_| LogSetupError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig::new("leafscan=loud", dir.path(), "test");

        // RUST_LOG, when set in the test environment, takes precedence.
        if std::env::var_os("RUST_LOG").is_none() {
            let err = config.env_filter().unwrap_err();
            assert!(matches!(err, LogSetupError::Filter { .. }), "{err}");
        }
    }
}
