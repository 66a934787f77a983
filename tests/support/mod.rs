#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use agent_backend::{SessionId, TurnId};
use agent_chat::app::{App, HostOps};
use agent_chat::runtime::RuntimeController;

#[derive(Default)]
pub struct HostSpy {
    pub opened_streams: Vec<(TurnId, String)>,
    pub closed_streams: Vec<TurnId>,
    pub submitted_queries: Vec<(TurnId, String)>,
    pub submitted_feedback: Vec<(TurnId, String)>,
    pub session_ids: Vec<SessionId>,
    pub render_requests: usize,
    pub stop_requests: usize,
    pub fail_stream_open: Option<String>,
    pub fail_query_spawn: Option<String>,
    pub fail_feedback_spawn: Option<String>,
}

impl HostOps for HostSpy {
    fn open_log_stream(
        &mut self,
        turn_id: TurnId,
        session_id: &SessionId,
        query: &str,
    ) -> Result<(), String> {
        self.session_ids.push(session_id.clone());
        if let Some(error) = self.fail_stream_open.clone() {
            return Err(error);
        }
        self.opened_streams.push((turn_id, query.to_string()));
        Ok(())
    }

    fn close_log_stream(&mut self, turn_id: TurnId) {
        self.closed_streams.push(turn_id);
    }

    fn submit_query(
        &mut self,
        turn_id: TurnId,
        session_id: &SessionId,
        query: &str,
    ) -> Result<(), String> {
        self.session_ids.push(session_id.clone());
        if let Some(error) = self.fail_query_spawn.clone() {
            return Err(error);
        }
        self.submitted_queries.push((turn_id, query.to_string()));
        Ok(())
    }

    fn submit_feedback(
        &mut self,
        turn_id: TurnId,
        session_id: &SessionId,
        feedback: &str,
    ) -> Result<(), String> {
        self.session_ids.push(session_id.clone());
        if let Some(error) = self.fail_feedback_spawn.clone() {
            return Err(error);
        }
        self.submitted_feedback.push((turn_id, feedback.to_string()));
        Ok(())
    }

    fn request_render(&mut self) {
        self.render_requests += 1;
    }

    fn request_stop(&mut self) {
        self.stop_requests += 1;
    }
}

impl HostSpy {
    pub fn last_query_turn(&self) -> TurnId {
        self.submitted_queries
            .last()
            .map(|(turn_id, _)| *turn_id)
            .expect("a query should have been submitted")
    }

    pub fn last_feedback_turn(&self) -> TurnId {
        self.submitted_feedback
            .last()
            .map(|(turn_id, _)| *turn_id)
            .expect("feedback should have been submitted")
    }
}

pub fn log_texts(app: &App) -> Vec<String> {
    app.logs().iter().map(|entry| entry.content.clone()).collect()
}

pub fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Flushes controller events until `predicate` holds on the app or the deadline passes.
pub fn flush_until<F>(controller: &Arc<RuntimeController>, app: &Arc<Mutex<App>>, predicate: F) -> bool
where
    F: Fn(&App) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        controller.flush_pending_events();
        if predicate(&lock_unpoisoned(app)) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}
