//! Minimal backend-agnostic contract for one remote agent conversation.
//!
//! This crate defines only the shared turn/feedback/log-stream vocabulary and the
//! [`AgentBackend`] trait. It excludes transport details, wire payloads, and the
//! coordinator state machine that sequences turns.

use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};

/// Generation identifier for one turn (a query or a feedback exchange).
pub type TurnId = u64;

/// Shared cancellation flag for a channel operation.
pub type CancelSignal = Arc<AtomicBool>;

/// Opaque conversation identifier sent as `thread_id` on every exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned while constructing/configuring a backend before any turn starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInitError {
    message: String,
}

impl BackendInitError {
    /// Creates a new backend initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for BackendInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BackendInitError {}

impl From<String> for BackendInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for BackendInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Input for a query turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub session_id: SessionId,
    pub query: String,
}

/// Input for the human-feedback exchange that resumes a paused conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRequest {
    pub session_id: SessionId,
    pub feedback: String,
}

/// Subscription key for the activity log of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStreamRequest {
    pub session_id: SessionId,
    pub query: String,
}

/// Authoritative result of a query turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The agent produced a final response.
    Answered { text: String },
    /// The agent is blocked and requires human intervention.
    Paused,
    /// Transport or server error.
    Failed { reason: String },
}

/// Result of a feedback exchange. A feedback exchange never re-pauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackOutcome {
    Answered { text: String },
    Failed { reason: String },
}

/// Classified activity event delivered by a log stream, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogStreamEvent {
    Log { content: String },
    Done,
}

/// Immutable metadata describing a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendProfile {
    pub backend_id: String,
    pub endpoint: Option<String>,
}

/// Backend interface for the three remote exchanges of a chat session.
///
/// Every method is blocking and is called from a dedicated worker thread.
pub trait AgentBackend: Send + Sync + 'static {
    /// Returns backend identity metadata.
    fn profile(&self) -> BackendProfile;

    /// Submits the user's query and waits for the authoritative outcome.
    fn submit_query(&self, req: QueryRequest) -> TurnOutcome;

    /// Submits human feedback for a paused conversation.
    fn submit_feedback(&self, req: FeedbackRequest) -> FeedbackOutcome;

    /// Consumes the activity log for one query, emitting events in server order.
    ///
    /// Returns `Ok(())` on a natural end (a `Done` event or end of body) or when
    /// `cancel` is raised. Returns `Err` on a transport failure; callers treat
    /// that as closure, never as a turn failure.
    fn stream_logs(
        &self,
        req: LogStreamRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(LogStreamEvent),
    ) -> Result<(), String>;
}
