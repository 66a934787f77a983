//! Deterministic mock implementation of the shared `agent_backend` contract.
//!
//! This crate contains no transport/protocol logic and is intended for local
//! development and coordinator-level integration testing.

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use agent_backend::{
    AgentBackend, BackendProfile, CancelSignal, FeedbackOutcome, FeedbackRequest, LogStreamEvent,
    LogStreamRequest, QueryRequest, TurnOutcome,
};

/// Stable backend identifier used for explicit startup selection.
pub const MOCK_BACKEND_ID: &str = "mock";

/// Deterministic mock backend used by `agent_chat` tests and local runs.
///
/// Queries containing the pause keyword pause the session; the next feedback
/// for that session resumes it.
#[derive(Debug)]
pub struct MockBackend {
    log_lines: Vec<String>,
    pause_keyword: Option<String>,
    turn_delay: Duration,
    log_delay: Duration,
    paused_sessions: Mutex<HashSet<String>>,
}

impl MockBackend {
    const TURN_DELAY_MS: u64 = 600;
    const LOG_DELAY_MS: u64 = 150;

    /// Creates a mock backend that streams `log_lines` for every query.
    #[must_use]
    pub fn new(log_lines: Vec<String>) -> Self {
        Self {
            log_lines,
            pause_keyword: Some("help".to_string()),
            turn_delay: Duration::from_millis(Self::TURN_DELAY_MS),
            log_delay: Duration::from_millis(Self::LOG_DELAY_MS),
            paused_sessions: Mutex::new(HashSet::new()),
        }
    }

    /// Sets the case-insensitive keyword that makes a query pause. `None` never pauses.
    #[must_use]
    pub fn with_pause_keyword(mut self, keyword: Option<&str>) -> Self {
        self.pause_keyword = keyword
            .map(str::trim)
            .filter(|keyword| !keyword.is_empty())
            .map(str::to_lowercase);
        self
    }

    #[must_use]
    pub fn with_delays(mut self, turn_delay: Duration, log_delay: Duration) -> Self {
        self.turn_delay = turn_delay;
        self.log_delay = log_delay;
        self
    }

    fn should_pause(&self, query: &str) -> bool {
        self.pause_keyword
            .as_deref()
            .is_some_and(|keyword| query.to_lowercase().contains(keyword))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new(vec![
            "Starting tool: duckduckgo_search".to_string(),
            "Tool finished: duckduckgo_search".to_string(),
            "Drafting summary".to_string(),
        ])
    }
}

impl AgentBackend for MockBackend {
    fn profile(&self) -> BackendProfile {
        BackendProfile {
            backend_id: MOCK_BACKEND_ID.to_string(),
            endpoint: None,
        }
    }

    fn submit_query(&self, req: QueryRequest) -> TurnOutcome {
        thread::sleep(self.turn_delay);

        if self.should_pause(&req.query) {
            lock_unpoisoned(&self.paused_sessions).insert(req.session_id.as_str().to_string());
            return TurnOutcome::Paused;
        }

        TurnOutcome::Answered {
            text: format!("Mock research summary for: {}", req.query),
        }
    }

    fn submit_feedback(&self, req: FeedbackRequest) -> FeedbackOutcome {
        thread::sleep(self.turn_delay);

        if !lock_unpoisoned(&self.paused_sessions).remove(req.session_id.as_str()) {
            return FeedbackOutcome::Failed {
                reason: format!("session {} is not paused", req.session_id),
            };
        }

        FeedbackOutcome::Answered {
            text: format!("Resumed with your guidance: {}", req.feedback),
        }
    }

    fn stream_logs(
        &self,
        req: LogStreamRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(LogStreamEvent),
    ) -> Result<(), String> {
        let _ = req.session_id;

        for line in &self.log_lines {
            if cancel.load(Ordering::SeqCst) {
                return Ok(());
            }
            emit(LogStreamEvent::Log {
                content: line.clone(),
            });
            thread::sleep(self.log_delay);
        }

        if self.should_pause(&req.query) {
            if cancel.load(Ordering::SeqCst) {
                return Ok(());
            }
            emit(LogStreamEvent::Log {
                content: "Agent requested human review".to_string(),
            });
        }

        if cancel.load(Ordering::SeqCst) {
            return Ok(());
        }
        emit(LogStreamEvent::Done);
        Ok(())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
