//! Application logging functionality
//!
//! Installs the tracing subscriber for the binary: formatted output on
//! stderr, plus an optional daily log file under ~/.config/bezy/logs/.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, Registry};

use crate::core::config_file::ConfigFile;

pub const LOG_FILE_PREFIX: &str = "bezy-objects.log";

/// Keeps the file writer flushing until dropped
pub struct LogGuard {
    _file: Option<WorkerGuard>,
    pub log_dir: Option<PathBuf>,
    /// False when another subscriber was already installed
    pub installed: bool,
}

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    ConfigFile::logs_dir()
}

/// Initialize the logs directory
pub fn initialize_logs_directory(logs_dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("could not create {}", logs_dir.display()))
}

/// Install `subscriber` globally, reporting on stderr when one is already set
fn install<S>(subscriber: S) -> bool
where
    S: tracing::Subscriber + Send + Sync + 'static,
{
    match tracing::subscriber::set_global_default(subscriber) {
        Ok(()) => true,
        Err(error) => {
            eprintln!("Could not install the log subscriber: {error}");
            false
        }
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for JSON output.
pub fn init(filter: &str, log_to_file: bool) -> anyhow::Result<LogGuard> {
    let env_filter = EnvFilter::try_new(filter)
        .with_context(|| format!("invalid log filter '{filter}'"))?;
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if !log_to_file {
        let subscriber = Registry::default().with(env_filter).with(stderr_layer);
        let installed = install(subscriber);
        return Ok(LogGuard {
            _file: None,
            log_dir: None,
            installed,
        });
    }

    let log_dir = logs_dir();
    initialize_logs_directory(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        );
    let installed = install(subscriber);
    Ok(LogGuard {
        _file: Some(guard),
        log_dir: Some(log_dir),
        installed,
    })
}
