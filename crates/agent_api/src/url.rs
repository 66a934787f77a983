use crate::error::AgentApiError;

/// Default base URL of the research agent backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const CHAT_PATH: &str = "/chat";
pub const FEEDBACK_PATH: &str = "/human-feedback";
pub const STREAM_PATH: &str = "/stream";

/// Normalize a configured base URL.
///
/// Blank input falls back to [`DEFAULT_BASE_URL`]; surrounding whitespace and
/// trailing slashes are removed so endpoint paths can be appended verbatim.
pub fn normalize_base_url(input: &str) -> String {
    let base = if input.trim().is_empty() {
        DEFAULT_BASE_URL
    } else {
        input.trim()
    };

    base.trim_end_matches('/').to_string()
}

/// Validates that a base URL is an absolute http(s) URL.
pub fn validate_base_url(input: &str) -> Result<::url::Url, AgentApiError> {
    let normalized = normalize_base_url(input);
    let parsed = ::url::Url::parse(&normalized)
        .map_err(|error| AgentApiError::InvalidBaseUrl(format!("{normalized}: {error}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(AgentApiError::InvalidBaseUrl(format!(
            "{normalized}: unsupported scheme '{other}'"
        ))),
    }
}

pub fn chat_url(base_url: &str) -> String {
    format!("{}{CHAT_PATH}", normalize_base_url(base_url))
}

pub fn feedback_url(base_url: &str) -> String {
    format!("{}{FEEDBACK_PATH}", normalize_base_url(base_url))
}

/// Builds the log-stream subscription URL with `query` and `thread_id` encoded.
pub fn stream_url(
    base_url: &str,
    query: &str,
    thread_id: &str,
) -> Result<::url::Url, AgentApiError> {
    let endpoint = format!("{}{STREAM_PATH}", normalize_base_url(base_url));
    ::url::Url::parse_with_params(&endpoint, &[("query", query), ("thread_id", thread_id)])
        .map_err(|error| AgentApiError::InvalidBaseUrl(format!("{endpoint}: {error}")))
}
