use serde::{Deserialize, Serialize};

/// Body of `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub thread_id: String,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            thread_id: thread_id.into(),
        }
    }
}

/// Body of `POST /human-feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub thread_id: String,
    pub feedback: String,
}

impl FeedbackRequest {
    pub fn new(thread_id: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            feedback: feedback.into(),
        }
    }
}

pub const STATUS_PAUSED: &str = "paused";

/// Response of `POST /chat`.
///
/// Servers answer with `"ok"` or `"completed"` for a finished turn and
/// `"paused"` when the agent waits for human input. The paused response may
/// still carry an explanatory `response` text which callers ignore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
}

impl ChatResponse {
    pub fn is_paused(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.trim().eq_ignore_ascii_case(STATUS_PAUSED))
    }
}

/// Response of `POST /human-feedback`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
