//! Transport-only client primitives for the remote research agent.
//!
//! This crate owns request building, response parsing, and SSE framing for the
//! three agent endpoints (`/chat`, `/human-feedback`, `/stream`). It contains no
//! conversation state and no retry policy: every exchange is attempted once.
//!
//! Stream classification keeps only `log` and `done` events; everything else on
//! the wire (token deltas, unknown types, malformed frames) is dropped by
//! [`SseStreamParser`].

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod payload;
pub mod sse;
pub mod url;

pub use client::AgentApiClient;
pub use client::CancellationSignal;
pub use client::StreamResult;
pub use config::AgentApiConfig;
pub use error::AgentApiError;
pub use events::{AgentStreamEvent, StreamEnd};
pub use payload::{ChatRequest, ChatResponse, FeedbackRequest, FeedbackResponse};
pub use sse::SseStreamParser;
pub use crate::url::normalize_base_url;
