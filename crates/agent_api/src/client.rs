use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::config::AgentApiConfig;
use crate::error::{parse_error_message, AgentApiError};
use crate::events::{AgentStreamEvent, StreamEnd};
use crate::headers::{build_headers, MEDIA_TYPE_EVENT_STREAM, MEDIA_TYPE_JSON};
use crate::payload::{ChatRequest, ChatResponse, FeedbackRequest, FeedbackResponse};
use crate::sse::SseStreamParser;
use crate::url::{chat_url, feedback_url, normalize_base_url, stream_url, validate_base_url};

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct AgentApiClient {
    http: Client,
    config: AgentApiConfig,
}

#[derive(Debug, Clone)]
pub struct StreamResult {
    pub events: Vec<AgentStreamEvent>,
    pub end: StreamEnd,
}

impl AgentApiClient {
    pub fn new(config: AgentApiConfig) -> Result<Self, AgentApiError> {
        validate_base_url(&config.base_url)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(AgentApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AgentApiConfig {
        &self.config
    }

    pub fn base_url(&self) -> String {
        normalize_base_url(&self.config.base_url)
    }

    pub fn build_headers(&self, accept: &str) -> Result<HeaderMap, AgentApiError> {
        let headers = build_headers(&self.config, accept);
        let mut out = HeaderMap::new();
        for (key, value) in headers {
            out.insert(
                HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
                    AgentApiError::Unknown(format!("invalid header key: {key}"))
                })?,
                HeaderValue::from_str(&value).map_err(|_| {
                    AgentApiError::Unknown(format!("invalid header value for {key}"))
                })?,
            );
        }
        Ok(out)
    }

    pub fn build_chat_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, AgentApiError> {
        let builder = self
            .http
            .post(chat_url(&self.config.base_url))
            .headers(self.build_headers(MEDIA_TYPE_JSON)?)
            .json(request);
        Ok(self.with_request_timeout(builder))
    }

    pub fn build_feedback_request(
        &self,
        request: &FeedbackRequest,
    ) -> Result<reqwest::RequestBuilder, AgentApiError> {
        let builder = self
            .http
            .post(feedback_url(&self.config.base_url))
            .headers(self.build_headers(MEDIA_TYPE_JSON)?)
            .json(request);
        Ok(self.with_request_timeout(builder))
    }

    pub fn build_stream_request(
        &self,
        query: &str,
        thread_id: &str,
    ) -> Result<reqwest::RequestBuilder, AgentApiError> {
        let url = stream_url(&self.config.base_url, query, thread_id)?;
        Ok(self
            .http
            .get(url)
            .headers(self.build_headers(MEDIA_TYPE_EVENT_STREAM)?))
    }

    fn with_request_timeout(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Sends one research query. Attempted exactly once.
    pub async fn submit_chat(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<ChatResponse, AgentApiError> {
        tracing::debug!(thread_id = %request.thread_id, "POST /chat");
        let builder = self.build_chat_request(request)?;
        let response = send_checked(builder, cancellation).await?;
        read_json(response, cancellation).await
    }

    /// Sends human feedback for a paused session. Attempted exactly once.
    pub async fn submit_feedback(
        &self,
        request: &FeedbackRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<FeedbackResponse, AgentApiError> {
        tracing::debug!(thread_id = %request.thread_id, "POST /human-feedback");
        let builder = self.build_feedback_request(request)?;
        let response = send_checked(builder, cancellation).await?;
        read_json(response, cancellation).await
    }

    /// Subscribes to the log stream and forwards classified events.
    ///
    /// Returns once a `done` event arrives or the body ends. Events after
    /// `done` are never delivered.
    pub async fn stream_with_handler<F>(
        &self,
        query: &str,
        thread_id: &str,
        cancellation: Option<&CancellationSignal>,
        mut on_event: F,
    ) -> Result<StreamEnd, AgentApiError>
    where
        F: FnMut(AgentStreamEvent),
    {
        tracing::debug!(thread_id, "GET /stream");
        let builder = self.build_stream_request(query, thread_id)?;
        let response = send_checked(builder, cancellation).await?;
        let mut bytes = response.bytes_stream();
        let mut parser = SseStreamParser::default();

        loop {
            let Some(chunk) = await_or_cancel(bytes.next(), cancellation).await? else {
                break;
            };
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }
            let chunk = chunk.map_err(AgentApiError::from)?;
            for event in parser.feed(&chunk) {
                let done = event.is_done();
                on_event(event);
                if done {
                    tracing::trace!(thread_id, "log stream reported done");
                    return Ok(StreamEnd::Done);
                }
            }
        }

        if is_cancelled(cancellation) {
            return Err(AgentApiError::Cancelled);
        }

        tracing::trace!(thread_id, "log stream body ended without done");
        Ok(StreamEnd::EndOfBody)
    }

    pub async fn stream(
        &self,
        query: &str,
        thread_id: &str,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<StreamResult, AgentApiError> {
        let mut events = Vec::new();
        let end = self
            .stream_with_handler(query, thread_id, cancellation, |event| {
                events.push(event);
            })
            .await?;

        Ok(StreamResult { events, end })
    }
}

async fn send_checked(
    builder: reqwest::RequestBuilder,
    cancellation: Option<&CancellationSignal>,
) -> Result<Response, AgentApiError> {
    if is_cancelled(cancellation) {
        return Err(AgentApiError::Cancelled);
    }

    let response = await_or_cancel(builder.send(), cancellation)
        .await?
        .map_err(AgentApiError::from)?;
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = await_or_cancel(response.text(), cancellation)
        .await?
        .unwrap_or_default();
    let message = parse_error_message(status, &body);
    tracing::debug!(%status, %message, "agent backend returned error status");
    Err(AgentApiError::Status(status, message))
}

async fn read_json<T>(
    response: Response,
    cancellation: Option<&CancellationSignal>,
) -> Result<T, AgentApiError>
where
    T: DeserializeOwned,
{
    let body = await_or_cancel(response.text(), cancellation)
        .await?
        .map_err(AgentApiError::from)?;
    decode_body(&body)
}

fn decode_body<T>(body: &str) -> Result<T, AgentApiError>
where
    T: DeserializeOwned,
{
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|error| AgentApiError::MalformedResponse(format!("invalid JSON: {error}")))?;
    if !value.is_object() {
        return Err(AgentApiError::MalformedResponse(format!(
            "expected a JSON object, got {value}"
        )));
    }
    serde_json::from_value(value).map_err(AgentApiError::from)
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, AgentApiError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(AgentApiError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(AgentApiError::Cancelled);
            }
            return Ok(output);
        }
    }
}
