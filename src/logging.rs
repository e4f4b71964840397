// Structured logging setup
// The TUI owns the terminal, so logs go to a file unless told otherwise.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a full `EnvFilter` directive
pub const FILTER_ENV: &str = "KUBETERM_LOG";

#[derive(
    Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LogSettings {
    pub level: LogLevel,
    /// `None` writes to stderr
    pub file: Option<PathBuf>,
}

impl LogSettings {
    /// File next to other temp artifacts when nothing else is configured
    pub fn default_file() -> PathBuf {
        std::env::temp_dir().join("kubeterm.log")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to open log file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to configure logger: {0}")]
    Configure(String),
}

static INIT: OnceLock<()> = OnceLock::new();
static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. Later calls are no-ops.
pub fn init(settings: &LogSettings) -> Result<(), InitError> {
    if INIT.get().is_some() {
        return Ok(());
    }

    let (writer, guard) = match &settings.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| InitError::Io {
                    path: path.clone(),
                    source,
                })?;
            tracing_appender::non_blocking(file)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(settings.level))
        .with_level(true)
        .with_target(settings.level >= LogLevel::Debug)
        .with_ansi(settings.file.is_none())
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| InitError::Configure(err.to_string()))?;

    let _ = GUARD.set(guard);
    INIT.set(()).ok();
    Ok(())
}

fn build_env_filter(level: LogLevel) -> EnvFilter {
    match std::env::var(FILTER_ENV) {
        Ok(filter) if !filter.trim().is_empty() => EnvFilter::new(filter),
        _ => EnvFilter::new(default_filter_for(level)),
    }
}

/// Crate logs at the requested level; dependencies stay at warn unless
/// tracing everything
fn default_filter_for(level: LogLevel) -> String {
    match level {
        LogLevel::Trace => "warn,kubeterm=trace,tungstenite=debug,tokio_tungstenite=debug".to_string(),
        LogLevel::Debug => "warn,kubeterm=debug".to_string(),
        other => other.as_str().to_string(),
    }
}
