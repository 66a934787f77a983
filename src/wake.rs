//! Blocking wake primitive for the client event loop.
//!
//! Producers (the stdin reader, channel workers, the coordinator) flag work and
//! notify; the loop thread sleeps in [`RuntimeWake::wait_for_event`] until at
//! least one flag is set.
//!
//! Closing input is not a stop: lines queued before [`RuntimeWake::close_input`]
//! are still drained, and the loop decides when the session has settled.

use std::sync::{Condvar, Mutex, MutexGuard};

#[derive(Default)]
struct RuntimeWakeState {
    pending_inputs: Vec<String>,
    input_closed: bool,
    input_closed_pending: bool,
    events_pending: bool,
    render_requested: bool,
    stop_requested: bool,
}

impl RuntimeWakeState {
    fn has_work(&self) -> bool {
        self.stop_requested
            || !self.pending_inputs.is_empty()
            || self.input_closed_pending
            || self.events_pending
            || self.render_requested
    }
}

#[derive(Default)]
pub struct RuntimeWake {
    state: Mutex<RuntimeWakeState>,
    cvar: Condvar,
}

impl RuntimeWake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until work is flagged. Returns `false` once a stop was requested.
    pub fn wait_for_event(&self) -> bool {
        let mut state = self.lock_state();

        while !state.has_work() {
            state = self
                .cvar
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }

        !state.stop_requested
    }

    pub fn enqueue_input(&self, line: String) {
        let mut state = self.lock_state();
        state.pending_inputs.push(line);
        self.cvar.notify_one();
    }

    pub fn drain_inputs(&self) -> Vec<String> {
        let mut state = self.lock_state();
        std::mem::take(&mut state.pending_inputs)
    }

    /// Marks the input source as exhausted. Wakes the loop once.
    pub fn close_input(&self) {
        let mut state = self.lock_state();
        if !state.input_closed {
            state.input_closed = true;
            state.input_closed_pending = true;
        }
        self.cvar.notify_one();
    }

    pub fn take_input_closed(&self) -> bool {
        let mut state = self.lock_state();
        std::mem::take(&mut state.input_closed_pending)
    }

    pub fn is_input_closed(&self) -> bool {
        self.lock_state().input_closed
    }

    pub fn signal_events(&self) {
        let mut state = self.lock_state();
        state.events_pending = true;
        self.cvar.notify_one();
    }

    pub fn take_events_pending(&self) -> bool {
        let mut state = self.lock_state();
        std::mem::take(&mut state.events_pending)
    }

    pub fn request_render(&self) {
        let mut state = self.lock_state();
        state.render_requested = true;
        self.cvar.notify_one();
    }

    pub fn take_render_requested(&self) -> bool {
        let mut state = self.lock_state();
        std::mem::take(&mut state.render_requested)
    }

    pub fn request_stop(&self) {
        let mut state = self.lock_state();
        state.stop_requested = true;
        self.cvar.notify_all();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.lock_state().stop_requested
    }

    fn lock_state(&self) -> MutexGuard<'_, RuntimeWakeState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
