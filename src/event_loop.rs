//! Blocking client loop: input dispatch, event flushing, and rendering.
//!
//! Lines are queued in arrival order. A plain line is dispatched only while no
//! turn is in flight, so scripted input such as `query` then `feedback` is
//! applied in order. Slash commands at the head of the queue run immediately.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::app::App;
use crate::commands::{parse_slash_command, SlashCommand, HELP_TEXT};
use crate::runtime::RuntimeController;
use crate::view::TranscriptView;
use crate::wake::RuntimeWake;

pub struct EventLoop<W: Write> {
    controller: Arc<RuntimeController>,
    wake: Arc<RuntimeWake>,
    view: TranscriptView,
    out: W,
    queued_inputs: VecDeque<String>,
}

impl<W: Write> EventLoop<W> {
    pub fn new(
        controller: Arc<RuntimeController>,
        wake: Arc<RuntimeWake>,
        view: TranscriptView,
        out: W,
    ) -> Self {
        Self {
            controller,
            wake,
            view,
            out,
            queued_inputs: VecDeque::new(),
        }
    }

    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        self.view.notice(text, &mut self.out)
    }

    /// Runs until a stop is requested, or input is closed and the session settled.
    pub fn run(&mut self) -> io::Result<()> {
        while self.run_blocking_once()? {}
        self.controller.shutdown();
        Ok(())
    }

    /// Waits for one batch of work and handles it. Returns `false` when the loop should end.
    pub fn run_blocking_once(&mut self) -> io::Result<bool> {
        if !self.wake.wait_for_event() {
            return Ok(false);
        }

        self.wake.take_input_closed();
        self.queued_inputs.extend(self.wake.drain_inputs());

        if self.wake.take_events_pending() {
            self.controller.flush_pending_events();
        }

        self.dispatch_queued_inputs()?;

        if self.wake.take_render_requested() {
            let snapshot = self.lock_app().snapshot();
            self.view.render(&snapshot, &mut self.out)?;
        }

        if self.wake.is_stop_requested() {
            return Ok(false);
        }

        Ok(!self.is_settled_after_input_closed())
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn dispatch_queued_inputs(&mut self) -> io::Result<()> {
        while !self.wake.is_stop_requested() {
            let Some(line) = self.queued_inputs.front() else {
                break;
            };

            let command = parse_slash_command(line);
            if command.is_none() && self.lock_app().is_sending() {
                break;
            }

            let Some(line) = self.queued_inputs.pop_front() else {
                break;
            };
            match command {
                Some(command) => self.handle_command(command)?,
                None => {
                    let mut host = Arc::clone(&self.controller);
                    self.lock_app().on_input(&line, &mut host);
                }
            }
        }

        Ok(())
    }

    fn handle_command(&mut self, command: SlashCommand) -> io::Result<()> {
        match command {
            SlashCommand::Help => self.notice(HELP_TEXT),
            SlashCommand::Session => {
                let session_id = self.lock_app().session_id().clone();
                self.notice(&format!("Session {session_id}"))
            }
            SlashCommand::Quit => {
                let mut host = Arc::clone(&self.controller);
                self.lock_app().request_exit(&mut host);
                Ok(())
            }
            SlashCommand::Unknown(command) => {
                self.notice(&format!("Unknown command {command}. Try /help"))
            }
        }
    }

    /// Input is exhausted and nothing is in flight: idle, or paused with no feedback left.
    fn is_settled_after_input_closed(&self) -> bool {
        self.wake.is_input_closed()
            && self.queued_inputs.is_empty()
            && !self.lock_app().is_sending()
    }

    fn lock_app(&self) -> MutexGuard<'_, App> {
        lock_unpoisoned(self.controller.app())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
