//! Terminal chat client for a remote research agent.
//!
//! The [`app::App`] coordinator owns the conversation: messages, activity logs,
//! and the `Idle`/`Sending`/`Paused` turn state. Each query turn runs two
//! channels concurrently: a one-shot exchange that carries the authoritative
//! outcome ([`turn`]) and a best-effort activity log stream ([`stream`]). Their
//! completions are funneled back through [`runtime::RuntimeController`] and
//! applied on the event-loop thread, one at a time.
//!
//! ## Backend bootstrap
//!
//! - `AGENT_CHAT_BACKEND=http` (default) talks to the agent server at
//!   `AGENT_CHAT_BASE_URL` (default `http://localhost:8000`).
//! - `AGENT_CHAT_BACKEND=mock` uses a deterministic offline backend; queries
//!   containing "help" pause for human feedback.
//!
//! `AGENT_CHAT_TURN_TIMEOUT_SEC` bounds `/chat` and `/human-feedback` (default
//! 120, must be > 0). The log stream has no timeout.
//!
//! ## Diagnostics
//!
//! Set `AGENT_CHAT_LOG` to a `tracing` filter (for example `agent_chat=debug`)
//! to enable diagnostics on stderr, or in `AGENT_CHAT_LOG_FILE` when set.

pub mod app;
pub mod backends;
pub mod commands;
pub mod config;
pub mod event_loop;
pub mod logging;
pub mod runtime;
pub mod stream;
pub mod turn;
pub mod view;
pub mod wake;
