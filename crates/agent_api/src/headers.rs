use std::collections::BTreeMap;

use crate::config::AgentApiConfig;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_CACHE_CONTROL: &str = "cache-control";
pub const HEADER_USER_AGENT: &str = "user-agent";

pub const MEDIA_TYPE_JSON: &str = "application/json";
pub const MEDIA_TYPE_EVENT_STREAM: &str = "text/event-stream";

/// Build a deterministic header map for agent requests.
///
/// `accept` selects the response media type: JSON for the one-shot exchanges,
/// which also carry a JSON body, or `text/event-stream` for the bodiless log
/// stream, which disables caching instead.
pub fn build_headers(config: &AgentApiConfig, accept: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();

    headers.insert(HEADER_ACCEPT.to_owned(), accept.to_owned());
    if accept == MEDIA_TYPE_JSON {
        headers.insert(HEADER_CONTENT_TYPE.to_owned(), MEDIA_TYPE_JSON.to_owned());
    }
    if accept == MEDIA_TYPE_EVENT_STREAM {
        headers.insert(HEADER_CACHE_CONTROL.to_owned(), "no-cache".to_owned());
    }

    let ua = config
        .user_agent
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(default_user_agent);
    headers.insert(HEADER_USER_AGENT.to_owned(), ua);

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    headers
}

fn default_user_agent() -> String {
    format!("agent_chat/{}", env!("CARGO_PKG_VERSION"))
}
