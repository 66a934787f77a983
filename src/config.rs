//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const BACKEND_ENV_VAR: &str = "AGENT_CHAT_BACKEND";
pub const BASE_URL_ENV_VAR: &str = "AGENT_CHAT_BASE_URL";
pub const TURN_TIMEOUT_ENV_VAR: &str = "AGENT_CHAT_TURN_TIMEOUT_SEC";
pub const LOG_ENV_VAR: &str = "AGENT_CHAT_LOG";
pub const LOG_FILE_ENV_VAR: &str = "AGENT_CHAT_LOG_FILE";

pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Http,
    Mock,
}

impl BackendKind {
    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            _ => Err(ConfigError::UnsupportedBackend(value.trim().to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported backend '{0}' in AGENT_CHAT_BACKEND (expected 'http' or 'mock')")]
    UnsupportedBackend(String),
    #[error("AGENT_CHAT_TURN_TIMEOUT_SEC must be an integer greater than zero, got '{0}'")]
    InvalidTurnTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub backend: BackendKind,
    pub base_url: Option<String>,
    pub turn_timeout: Duration,
    /// `tracing` filter directive; `None` disables diagnostics.
    pub log_filter: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Http,
            base_url: None,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
            log_filter: None,
            log_file: None,
        }
    }
}

impl EnvConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match env_string_opt(BACKEND_ENV_VAR) {
            Some(value) => BackendKind::parse(&value)?,
            None => BackendKind::Http,
        };

        let turn_timeout = match env_string_opt(TURN_TIMEOUT_ENV_VAR) {
            Some(value) => parse_turn_timeout(&value)?,
            None => DEFAULT_TURN_TIMEOUT,
        };

        Ok(Self {
            backend,
            base_url: env_string_opt(BASE_URL_ENV_VAR).map(|value| value.trim().to_string()),
            turn_timeout,
            log_filter: env_string_opt(LOG_ENV_VAR).map(|value| value.trim().to_string()),
            log_file: env_string_opt(LOG_FILE_ENV_VAR).map(PathBuf::from),
        })
    }
}

fn parse_turn_timeout(value: &str) -> Result<Duration, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ConfigError::InvalidTurnTimeout(value.trim().to_string())),
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}
