//! Turn Request Channel: one-shot query and feedback exchanges on worker threads.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use agent_backend::{
    AgentBackend, FeedbackOutcome, FeedbackRequest, QueryRequest, TurnId, TurnOutcome,
};

use crate::runtime::SessionEvent;

pub fn spawn_query_turn<E>(
    backend: Arc<dyn AgentBackend>,
    turn_id: TurnId,
    request: QueryRequest,
    emit: E,
) -> Result<JoinHandle<()>, String>
where
    E: FnOnce(SessionEvent) + Send + 'static,
{
    thread::Builder::new()
        .name(format!("agent-chat-turn-{turn_id}"))
        .spawn(move || {
            tracing::debug!(turn_id, "submitting query");
            let outcome = catch_unwind(AssertUnwindSafe(|| backend.submit_query(request)))
                .unwrap_or_else(|_| TurnOutcome::Failed {
                    reason: "Agent backend panicked".to_string(),
                });
            emit(SessionEvent::TurnResolved { turn_id, outcome });
        })
        .map_err(|error| format!("Failed to spawn turn worker: {error}"))
}

pub fn spawn_feedback_turn<E>(
    backend: Arc<dyn AgentBackend>,
    turn_id: TurnId,
    request: FeedbackRequest,
    emit: E,
) -> Result<JoinHandle<()>, String>
where
    E: FnOnce(SessionEvent) + Send + 'static,
{
    thread::Builder::new()
        .name(format!("agent-chat-feedback-{turn_id}"))
        .spawn(move || {
            tracing::debug!(turn_id, "submitting feedback");
            let outcome = catch_unwind(AssertUnwindSafe(|| backend.submit_feedback(request)))
                .unwrap_or_else(|_| FeedbackOutcome::Failed {
                    reason: "Agent backend panicked".to_string(),
                });
            emit(SessionEvent::FeedbackResolved { turn_id, outcome });
        })
        .map_err(|error| format!("Failed to spawn feedback worker: {error}"))
}
