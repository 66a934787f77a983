use serde::{Deserialize, Serialize};

/// Stream event emitted by the parser after classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    /// One line of agent activity.
    Log { content: String },
    /// Normal end of stream.
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
}

impl AgentStreamEvent {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

/// How a log stream ended when it was not cancelled or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server sent a `done` event.
    Done,
    /// The response body ended without a `done` event.
    EndOfBody,
}
