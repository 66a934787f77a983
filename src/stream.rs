//! Log Stream Channel: one worker thread per subscription.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use agent_backend::{AgentBackend, CancelSignal, LogStreamEvent, LogStreamRequest, TurnId};

use crate::runtime::SessionEvent;

/// Ownership token for an open log stream.
///
/// Dropping the handle does not close the stream; call [`ActiveStreamHandle::close`].
#[derive(Debug)]
pub struct ActiveStreamHandle {
    turn_id: TurnId,
    cancel: CancelSignal,
    join_handle: Option<JoinHandle<()>>,
}

impl ActiveStreamHandle {
    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }

    /// Stops delivery of further events. Idempotent.
    pub fn close(&mut self) {
        if !self.cancel.swap(true, Ordering::SeqCst) {
            tracing::debug!(turn_id = self.turn_id, "closing log stream");
        }

        if let Some(join_handle) = self.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }
}

/// Opens a log stream for `turn_id` on a dedicated thread without blocking.
///
/// Every classified `log` event is forwarded as [`SessionEvent::StreamLog`] in
/// server order. Exactly one [`SessionEvent::StreamClosed`] follows, after a
/// `done` event, end of body, transport failure, or [`ActiveStreamHandle::close`].
pub fn open_log_stream<E>(
    backend: Arc<dyn AgentBackend>,
    turn_id: TurnId,
    request: LogStreamRequest,
    emit: E,
) -> Result<ActiveStreamHandle, String>
where
    E: Fn(SessionEvent) + Send + 'static,
{
    let cancel: CancelSignal = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);

    let join_handle = thread::Builder::new()
        .name(format!("agent-chat-stream-{turn_id}"))
        .spawn(move || run_stream_worker(backend, turn_id, request, worker_cancel, emit))
        .map_err(|error| format!("Failed to spawn log stream worker: {error}"))?;

    Ok(ActiveStreamHandle {
        turn_id,
        cancel,
        join_handle: Some(join_handle),
    })
}

fn run_stream_worker<E>(
    backend: Arc<dyn AgentBackend>,
    turn_id: TurnId,
    request: LogStreamRequest,
    cancel: CancelSignal,
    emit: E,
) where
    E: Fn(SessionEvent),
{
    let mut done = false;
    let mut forward = |event: LogStreamEvent| {
        if done || cancel.load(Ordering::SeqCst) {
            return;
        }
        match event {
            LogStreamEvent::Log { content } => emit(SessionEvent::StreamLog { turn_id, content }),
            LogStreamEvent::Done => done = true,
        }
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        backend.stream_logs(request, Arc::clone(&cancel), &mut forward)
    }));

    let error = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(error)) => Some(error),
        Err(_) => Some("Log stream panicked".to_string()),
    };

    emit(SessionEvent::StreamClosed { turn_id, error });
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use agent_backend::{
        BackendProfile, FeedbackOutcome, FeedbackRequest, QueryRequest, SessionId, TurnOutcome,
    };

    use super::*;

    struct ScriptedStream {
        events: Vec<LogStreamEvent>,
        result: Result<(), String>,
    }

    impl AgentBackend for ScriptedStream {
        fn profile(&self) -> BackendProfile {
            BackendProfile {
                backend_id: "scripted".to_string(),
                endpoint: None,
            }
        }

        fn submit_query(&self, _req: QueryRequest) -> TurnOutcome {
            TurnOutcome::Paused
        }

        fn submit_feedback(&self, _req: FeedbackRequest) -> FeedbackOutcome {
            FeedbackOutcome::Failed {
                reason: "unused".to_string(),
            }
        }

        fn stream_logs(
            &self,
            _req: LogStreamRequest,
            _cancel: CancelSignal,
            emit: &mut dyn FnMut(LogStreamEvent),
        ) -> Result<(), String> {
            for event in &self.events {
                emit(event.clone());
            }
            self.result.clone()
        }
    }

    fn request() -> LogStreamRequest {
        LogStreamRequest {
            session_id: SessionId::new("thread_t"),
            query: "q".to_string(),
        }
    }

    fn collect_until_closed(rx: &mpsc::Receiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        loop {
            let event = rx
                .recv_timeout(Duration::from_secs(5))
                .expect("stream worker should report closure");
            let closed = matches!(event, SessionEvent::StreamClosed { .. });
            events.push(event);
            if closed {
                return events;
            }
        }
    }

    #[test]
    fn events_after_done_are_not_forwarded() {
        let backend = Arc::new(ScriptedStream {
            events: vec![
                LogStreamEvent::Log {
                    content: "a".to_string(),
                },
                LogStreamEvent::Done,
                LogStreamEvent::Log {
                    content: "late".to_string(),
                },
            ],
            result: Ok(()),
        });
        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);

        let mut handle = open_log_stream(backend, 3, request(), move |event| {
            let _ = tx.lock().map(|tx| tx.send(event));
        })
        .expect("stream worker should spawn");

        assert_eq!(
            collect_until_closed(&rx),
            vec![
                SessionEvent::StreamLog {
                    turn_id: 3,
                    content: "a".to_string(),
                },
                SessionEvent::StreamClosed {
                    turn_id: 3,
                    error: None,
                },
            ]
        );

        handle.close();
        handle.close();
        assert!(handle.cancel.load(Ordering::SeqCst));
        assert!(handle.join_handle.is_none());
    }

    #[test]
    fn transport_failure_is_reported_as_closure() {
        let backend = Arc::new(ScriptedStream {
            events: Vec::new(),
            result: Err("connection reset".to_string()),
        });
        let (tx, rx) = mpsc::channel();
        let tx = std::sync::Mutex::new(tx);

        let _handle = open_log_stream(backend, 4, request(), move |event| {
            let _ = tx.lock().map(|tx| tx.send(event));
        })
        .expect("stream worker should spawn");

        assert_eq!(
            collect_until_closed(&rx),
            vec![SessionEvent::StreamClosed {
                turn_id: 4,
                error: Some("connection reset".to_string()),
            }]
        );
    }
}
