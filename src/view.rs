//! Line-oriented transcript rendering.
//!
//! The view only reads [`SessionSnapshot`]s and prints what changed since the
//! previous render.

use std::io::{self, Write};

use time::UtcOffset;

use crate::app::{LogEntry, Message, Role, SessionSnapshot};

pub const THINKING_MARKER: &str = "… thinking";
pub const INTERVENTION_BANNER: &str =
    "=== Human intervention required: type feedback to resume the agent ===";

#[derive(Debug)]
pub struct TranscriptView {
    printed_messages: usize,
    printed_logs: usize,
    was_sending: bool,
    was_paused: bool,
    clock_offset: UtcOffset,
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::with_clock_offset(UtcOffset::UTC)
    }
}

impl TranscriptView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log clocks are printed in `clock_offset`, normally the local offset read at start-up.
    pub fn with_clock_offset(clock_offset: UtcOffset) -> Self {
        Self {
            printed_messages: 0,
            printed_logs: 0,
            was_sending: false,
            was_paused: false,
            clock_offset,
        }
    }

    pub fn render(&mut self, snapshot: &SessionSnapshot, out: &mut impl Write) -> io::Result<()> {
        for message in snapshot.messages.iter().skip(self.printed_messages) {
            writeln!(out, "{}", format_message(message))?;
        }
        self.printed_messages = snapshot.messages.len().max(self.printed_messages);

        for entry in snapshot.logs.iter().skip(self.printed_logs) {
            writeln!(out, "{}", format_log_entry(entry, self.clock_offset))?;
        }
        self.printed_logs = snapshot.logs.len().max(self.printed_logs);

        if snapshot.is_sending && !self.was_sending {
            writeln!(out, "{THINKING_MARKER}")?;
        }
        if snapshot.is_paused && !self.was_paused {
            writeln!(out, "{INTERVENTION_BANNER}")?;
        }
        self.was_sending = snapshot.is_sending;
        self.was_paused = snapshot.is_paused;

        out.flush()
    }

    pub fn notice(&self, text: &str, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{text}")?;
        out.flush()
    }
}

pub fn format_message(message: &Message) -> String {
    let label = match message.role {
        Role::User => "you",
        Role::Assistant => "agent",
    };
    format!("{label}> {}", message.content)
}

pub fn format_log_entry(entry: &LogEntry, clock_offset: UtcOffset) -> String {
    let clock = entry.timestamp.to_offset(clock_offset);
    format!(
        "[{:02}:{:02}:{:02}] {}",
        clock.hour(),
        clock.minute(),
        clock.second(),
        entry.content
    )
}
