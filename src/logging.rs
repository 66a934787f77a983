//! Diagnostic logging bootstrap.
//!
//! Diagnostics never reach the transcript. They are written to stderr or to the
//! file named by `AGENT_CHAT_LOG_FILE`, and only when `AGENT_CHAT_LOG` is set.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid AGENT_CHAT_LOG filter: {0}")]
    InvalidFilter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to open log file {path}: {source}")]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Installs the global subscriber. Returns `false` when logging is disabled.
pub fn init(config: &EnvConfig) -> Result<bool, LoggingError> {
    let Some(directive) = config.log_filter.as_deref() else {
        return Ok(false);
    };
    let filter = EnvFilter::try_new(directive)?;

    let installed = match config.log_file.as_ref() {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::OpenLogFile {
                    path: path.clone(),
                    source,
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    installed.map_err(|error| LoggingError::Install(error.to_string()))?;
    Ok(true)
}
