use agent_backend::{FeedbackOutcome, SessionId, TurnId, TurnOutcome};
use time::OffsetDateTime;
use uuid::Uuid;

pub const PAUSE_LOG_TEXT: &str = "⚠️ AGENT PAUSED: Requesting Human Intervention";
pub const FEEDBACK_LOG_PREFIX: &str = "👤 Human Feedback: ";
pub const TURN_ERROR_TEXT: &str = "Error communicating with backend.";
pub const FEEDBACK_ERROR_TEXT: &str = "Error sending feedback to backend.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: OffsetDateTime,
    pub content: String,
}

impl LogEntry {
    fn now(content: impl Into<String>) -> Self {
        Self {
            timestamp: OffsetDateTime::now_utc(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    Query,
    Feedback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    /// Waiting on the outcome of turn `turn_id`.
    Sending { turn_id: TurnId, kind: TurnKind },
    /// Query turn `turn_id` was paused by the agent.
    Paused { turn_id: TurnId },
}

/// Owned, read-only view of the coordinator state for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub messages: Vec<Message>,
    pub logs: Vec<LogEntry>,
    pub is_sending: bool,
    pub is_paused: bool,
}

pub trait HostOps {
    fn open_log_stream(
        &mut self,
        turn_id: TurnId,
        session_id: &SessionId,
        query: &str,
    ) -> Result<(), String>;
    fn close_log_stream(&mut self, turn_id: TurnId);
    fn submit_query(
        &mut self,
        turn_id: TurnId,
        session_id: &SessionId,
        query: &str,
    ) -> Result<(), String>;
    fn submit_feedback(
        &mut self,
        turn_id: TurnId,
        session_id: &SessionId,
        feedback: &str,
    ) -> Result<(), String>;
    fn request_render(&mut self);
    fn request_stop(&mut self);
}

/// Session Stream Coordinator: the single writer of conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    session_id: SessionId,
    messages: Vec<Message>,
    logs: Vec<LogEntry>,
    state: TurnState,
    next_turn_id: TurnId,
    /// Query turn whose log stream may still append entries.
    log_scope: Option<TurnId>,
    pub should_exit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

pub fn new_session_id() -> SessionId {
    SessionId::new(format!("thread_{}", Uuid::new_v4().simple()))
}

impl App {
    pub fn new() -> Self {
        Self::with_session_id(new_session_id())
    }

    pub fn with_session_id(session_id: SessionId) -> Self {
        Self {
            session_id,
            messages: Vec::new(),
            logs: Vec::new(),
            state: TurnState::Idle,
            next_turn_id: 1,
            log_scope: None,
            should_exit: false,
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        matches!(self.state, TurnState::Sending { .. })
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, TurnState::Paused { .. })
    }

    /// Returns the query turn whose stream is currently allowed to append logs.
    pub fn log_scope(&self) -> Option<TurnId> {
        self.log_scope
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            messages: self.messages.clone(),
            logs: self.logs.clone(),
            is_sending: self.is_sending(),
            is_paused: self.is_paused(),
        }
    }

    /// Routes a line of user input: a query when idle, feedback when paused.
    pub fn on_input(&mut self, text: &str, host: &mut dyn HostOps) {
        if self.is_paused() {
            self.submit_feedback(text, host);
        } else {
            self.submit(text, host);
        }
    }

    pub fn submit(&mut self, text: &str, host: &mut dyn HostOps) {
        let query = text.trim();
        if query.is_empty() {
            return;
        }
        if self.state != TurnState::Idle {
            tracing::debug!(state = ?self.state, "rejecting query submitted outside idle state");
            return;
        }

        self.messages.push(Message::user(query));
        let turn_id = self.allocate_turn_id();
        self.state = TurnState::Sending {
            turn_id,
            kind: TurnKind::Query,
        };

        self.log_scope = Some(turn_id);
        if let Err(error) = host.open_log_stream(turn_id, &self.session_id, query) {
            tracing::warn!(turn_id, %error, "log stream could not be opened");
            self.log_scope = None;
        }
        host.request_render();

        if let Err(error) = host.submit_query(turn_id, &self.session_id, query) {
            self.on_turn_resolved(turn_id, TurnOutcome::Failed { reason: error }, host);
        }
    }

    pub fn submit_feedback(&mut self, text: &str, host: &mut dyn HostOps) {
        let feedback = text.trim();
        if feedback.is_empty() {
            return;
        }
        if !self.is_paused() {
            tracing::debug!(state = ?self.state, "rejecting feedback submitted outside paused state");
            return;
        }

        self.logs
            .push(LogEntry::now(format!("{FEEDBACK_LOG_PREFIX}{feedback}")));
        let turn_id = self.allocate_turn_id();
        self.state = TurnState::Sending {
            turn_id,
            kind: TurnKind::Feedback,
        };
        host.request_render();

        if let Err(error) = host.submit_feedback(turn_id, &self.session_id, feedback) {
            self.on_feedback_resolved(turn_id, FeedbackOutcome::Failed { reason: error }, host);
        }
    }

    pub fn on_turn_resolved(&mut self, turn_id: TurnId, outcome: TurnOutcome, host: &mut dyn HostOps) {
        if !self.is_waiting_on(turn_id, TurnKind::Query) {
            tracing::debug!(turn_id, state = ?self.state, "ignoring stale turn outcome");
            return;
        }

        match outcome {
            TurnOutcome::Answered { text } => {
                self.messages.push(Message::assistant(text));
                host.close_log_stream(turn_id);
                self.state = TurnState::Idle;
            }
            TurnOutcome::Paused => {
                self.logs.push(LogEntry::now(PAUSE_LOG_TEXT));
                self.state = TurnState::Paused { turn_id };
            }
            TurnOutcome::Failed { reason } => {
                tracing::warn!(turn_id, %reason, "turn failed");
                self.messages.push(Message::assistant(TURN_ERROR_TEXT));
                host.close_log_stream(turn_id);
                self.state = TurnState::Idle;
            }
        }

        host.request_render();
    }

    pub fn on_feedback_resolved(
        &mut self,
        turn_id: TurnId,
        outcome: FeedbackOutcome,
        host: &mut dyn HostOps,
    ) {
        if !self.is_waiting_on(turn_id, TurnKind::Feedback) {
            tracing::debug!(turn_id, state = ?self.state, "ignoring stale feedback outcome");
            return;
        }

        match outcome {
            FeedbackOutcome::Answered { text } => self.messages.push(Message::assistant(text)),
            FeedbackOutcome::Failed { reason } => {
                tracing::warn!(turn_id, %reason, "feedback exchange failed");
                self.messages.push(Message::assistant(FEEDBACK_ERROR_TEXT));
            }
        }
        self.state = TurnState::Idle;

        host.request_render();
    }

    /// Appends a log line when it comes from the stream currently in scope.
    ///
    /// Lines may arrive after the owning turn resolved; they are appended
    /// without touching messages or turn state.
    pub fn on_stream_log(&mut self, turn_id: TurnId, content: String, host: &mut dyn HostOps) {
        if self.log_scope != Some(turn_id) {
            tracing::trace!(turn_id, "dropping log line from stream out of scope");
            return;
        }

        self.logs.push(LogEntry::now(content));
        host.request_render();
    }

    pub fn on_stream_closed(&mut self, turn_id: TurnId, error: Option<&str>) {
        if let Some(error) = error {
            tracing::warn!(turn_id, %error, "log stream closed with transport error");
        } else {
            tracing::debug!(turn_id, "log stream closed");
        }

        if self.log_scope == Some(turn_id) {
            self.log_scope = None;
        }
    }

    pub fn request_exit(&mut self, host: &mut dyn HostOps) {
        self.should_exit = true;
        host.request_stop();
    }

    fn is_waiting_on(&self, turn_id: TurnId, kind: TurnKind) -> bool {
        self.state == TurnState::Sending { turn_id, kind }
    }

    fn allocate_turn_id(&mut self) -> TurnId {
        let turn_id = self.next_turn_id;
        self.next_turn_id += 1;
        turn_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct HostStub {
        renders: usize,
    }

    impl HostOps for HostStub {
        fn open_log_stream(&mut self, _: TurnId, _: &SessionId, _: &str) -> Result<(), String> {
            Ok(())
        }

        fn close_log_stream(&mut self, _: TurnId) {}

        fn submit_query(&mut self, _: TurnId, _: &SessionId, _: &str) -> Result<(), String> {
            Ok(())
        }

        fn submit_feedback(&mut self, _: TurnId, _: &SessionId, _: &str) -> Result<(), String> {
            Ok(())
        }

        fn request_render(&mut self) {
            self.renders += 1;
        }

        fn request_stop(&mut self) {}
    }

    #[test]
    fn session_ids_are_prefixed_and_unique() {
        let first = new_session_id();
        let second = new_session_id();

        assert!(first.as_str().starts_with("thread_"));
        assert_eq!(first.as_str().len(), "thread_".len() + 32);
        assert_ne!(first, second);
    }

    #[test]
    fn turn_ids_increase_across_query_and_feedback_turns() {
        let mut app = App::new();
        let mut host = HostStub::default();

        app.submit("risky task", &mut host);
        assert_eq!(
            app.state(),
            TurnState::Sending {
                turn_id: 1,
                kind: TurnKind::Query
            }
        );

        app.on_turn_resolved(1, TurnOutcome::Paused, &mut host);
        app.submit_feedback("  proceed  ", &mut host);
        assert_eq!(
            app.state(),
            TurnState::Sending {
                turn_id: 2,
                kind: TurnKind::Feedback
            }
        );
        assert_eq!(
            app.logs().last().map(|entry| entry.content.as_str()),
            Some("👤 Human Feedback: proceed")
        );
    }

    #[test]
    fn query_outcome_cannot_resolve_a_feedback_turn() {
        let mut app = App::new();
        let mut host = HostStub::default();

        app.submit("risky task", &mut host);
        app.on_turn_resolved(1, TurnOutcome::Paused, &mut host);
        app.submit_feedback("proceed", &mut host);

        app.on_turn_resolved(
            2,
            TurnOutcome::Answered {
                text: "wrong channel".to_string(),
            },
            &mut host,
        );

        assert!(app.is_sending());
        assert_eq!(app.messages().len(), 1);
    }

    #[test]
    fn exit_request_sets_flag() {
        let mut app = App::new();
        let mut host = HostStub::default();

        app.request_exit(&mut host);
        assert!(app.should_exit);
    }
}
