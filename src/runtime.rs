use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use agent_backend::{
    AgentBackend, FeedbackOutcome, FeedbackRequest, LogStreamRequest, QueryRequest, SessionId,
    TurnId, TurnOutcome,
};

use crate::app::{App, HostOps};
use crate::stream::{self, ActiveStreamHandle};
use crate::turn;
use crate::wake::RuntimeWake;

/// Completion reported by a channel worker, applied to [`App`] on the loop thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StreamLog {
        turn_id: TurnId,
        content: String,
    },
    StreamClosed {
        turn_id: TurnId,
        error: Option<String>,
    },
    TurnResolved {
        turn_id: TurnId,
        outcome: TurnOutcome,
    },
    FeedbackResolved {
        turn_id: TurnId,
        outcome: FeedbackOutcome,
    },
}

impl SessionEvent {
    pub fn turn_id(&self) -> TurnId {
        match self {
            Self::StreamLog { turn_id, .. }
            | Self::StreamClosed { turn_id, .. }
            | Self::TurnResolved { turn_id, .. }
            | Self::FeedbackResolved { turn_id, .. } => *turn_id,
        }
    }
}

pub struct RuntimeController {
    app: Arc<Mutex<App>>,
    wake: Arc<RuntimeWake>,
    backend: Arc<dyn AgentBackend>,
    pending_events: Mutex<VecDeque<SessionEvent>>,
    active_stream: Mutex<Option<ActiveStreamHandle>>,
}

impl RuntimeController {
    /// Creates a controller that buffers channel events before applying them to `App`.
    ///
    /// The first event queued into an empty buffer signals `wake`; the event loop
    /// then calls [`RuntimeController::flush_pending_events`]. Headless callers
    /// (tests, embedders without a loop) call it directly.
    pub fn new(
        app: Arc<Mutex<App>>,
        backend: Arc<dyn AgentBackend>,
        wake: Arc<RuntimeWake>,
    ) -> Arc<Self> {
        Arc::new(Self {
            app,
            wake,
            backend,
            pending_events: Mutex::new(VecDeque::new()),
            active_stream: Mutex::new(None),
        })
    }

    pub fn app(&self) -> &Arc<Mutex<App>> {
        &self.app
    }

    /// Returns the turn whose log stream handle is currently held.
    pub fn active_stream_turn(&self) -> Option<TurnId> {
        self.lock_active_stream()
            .as_ref()
            .map(ActiveStreamHandle::turn_id)
    }

    fn event_emitter(self: &Arc<Self>) -> impl Fn(SessionEvent) + Send + 'static {
        let controller = Arc::clone(self);
        move |event| controller.enqueue_event(event)
    }

    fn enqueue_event(&self, event: SessionEvent) {
        let should_wake = {
            let mut queue = lock_unpoisoned(&self.pending_events);
            let should_wake = queue.is_empty();
            queue.push_back(event);
            should_wake
        };

        if should_wake {
            self.wake.signal_events();
        }
    }

    fn drain_pending_events(self: &Arc<Self>) -> usize {
        let mut drained = 0usize;

        loop {
            let event = {
                let mut pending_events = lock_unpoisoned(&self.pending_events);
                pending_events.pop_front()
            };

            match event {
                Some(event) => {
                    self.apply_session_event(event);
                    drained += 1;
                }
                None => break,
            }
        }

        drained
    }

    /// Drains queued channel events into `App` and schedules a render.
    pub fn flush_pending_events(self: &Arc<Self>) -> usize {
        let drained = self.drain_pending_events();
        if drained > 0 {
            self.wake.request_render();
        }

        drained
    }

    fn apply_session_event(self: &Arc<Self>, event: SessionEvent) {
        if let SessionEvent::StreamClosed { turn_id, .. } = &event {
            self.clear_active_stream_if_matching(*turn_id);
        }

        tracing::trace!(turn_id = event.turn_id(), ?event, "applying session event");

        let mut host = Arc::clone(self);
        let mut app = lock_unpoisoned(&self.app);
        match event {
            SessionEvent::StreamLog { turn_id, content } => {
                app.on_stream_log(turn_id, content, &mut host)
            }
            SessionEvent::StreamClosed { turn_id, error } => {
                app.on_stream_closed(turn_id, error.as_deref())
            }
            SessionEvent::TurnResolved { turn_id, outcome } => {
                app.on_turn_resolved(turn_id, outcome, &mut host)
            }
            SessionEvent::FeedbackResolved { turn_id, outcome } => {
                app.on_feedback_resolved(turn_id, outcome, &mut host)
            }
        }
    }

    fn clear_active_stream_if_matching(&self, turn_id: TurnId) {
        let mut active_stream = self.lock_active_stream();
        let matches = active_stream.as_ref().map(ActiveStreamHandle::turn_id) == Some(turn_id);
        if !matches {
            return;
        }

        if let Some(mut completed) = active_stream.take() {
            completed.close();
        }
    }

    fn open_log_stream_internal(
        self: &Arc<Self>,
        turn_id: TurnId,
        session_id: &SessionId,
        query: &str,
    ) -> Result<(), String> {
        let mut active_stream = self.lock_active_stream();
        if let Some(mut previous) = active_stream.take() {
            tracing::debug!(
                previous_turn_id = previous.turn_id(),
                turn_id,
                "superseding log stream"
            );
            previous.close();
        }

        let request = LogStreamRequest {
            session_id: session_id.clone(),
            query: query.to_string(),
        };
        let handle = stream::open_log_stream(
            Arc::clone(&self.backend),
            turn_id,
            request,
            self.event_emitter(),
        )?;
        *active_stream = Some(handle);

        Ok(())
    }

    fn close_log_stream_internal(&self, turn_id: TurnId) {
        let mut active_stream = self.lock_active_stream();
        let matches = active_stream.as_ref().map(ActiveStreamHandle::turn_id) == Some(turn_id);
        if !matches {
            return;
        }

        if let Some(mut handle) = active_stream.take() {
            handle.close();
        }
    }

    /// Closes any open log stream. Turn workers run to completion detached.
    pub fn shutdown(&self) {
        if let Some(mut handle) = self.lock_active_stream().take() {
            handle.close();
        }
    }

    fn lock_active_stream(&self) -> MutexGuard<'_, Option<ActiveStreamHandle>> {
        lock_unpoisoned(&self.active_stream)
    }
}

impl HostOps for Arc<RuntimeController> {
    fn open_log_stream(
        &mut self,
        turn_id: TurnId,
        session_id: &SessionId,
        query: &str,
    ) -> Result<(), String> {
        self.open_log_stream_internal(turn_id, session_id, query)
    }

    fn close_log_stream(&mut self, turn_id: TurnId) {
        self.close_log_stream_internal(turn_id);
    }

    fn submit_query(
        &mut self,
        turn_id: TurnId,
        session_id: &SessionId,
        query: &str,
    ) -> Result<(), String> {
        let request = QueryRequest {
            session_id: session_id.clone(),
            query: query.to_string(),
        };
        turn::spawn_query_turn(
            Arc::clone(&self.backend),
            turn_id,
            request,
            self.event_emitter(),
        )
        .map(drop)
    }

    fn submit_feedback(
        &mut self,
        turn_id: TurnId,
        session_id: &SessionId,
        feedback: &str,
    ) -> Result<(), String> {
        let request = FeedbackRequest {
            session_id: session_id.clone(),
            feedback: feedback.to_string(),
        };
        turn::spawn_feedback_turn(
            Arc::clone(&self.backend),
            turn_id,
            request,
            self.event_emitter(),
        )
        .map(drop)
    }

    fn request_render(&mut self) {
        self.wake.request_render();
    }

    fn request_stop(&mut self) {
        self.wake.request_stop();
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
