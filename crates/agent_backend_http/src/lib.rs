//! HTTP implementation of the shared `agent_backend` contract.
//!
//! This adapter translates `agent_api` transport results into the turn,
//! feedback, and log-stream outcomes expected by `agent_chat`. Every exchange is
//! attempted once; errors become `Failed` outcomes, never panics.

use std::sync::Arc;
use std::time::Duration;

use agent_api::{
    AgentApiClient, AgentApiConfig, AgentApiError, AgentStreamEvent, ChatRequest, ChatResponse,
    FeedbackResponse, StreamEnd,
};
use agent_backend::{
    AgentBackend, BackendInitError, BackendProfile, CancelSignal, FeedbackOutcome,
    FeedbackRequest, LogStreamEvent, LogStreamRequest, QueryRequest, TurnOutcome,
};

/// Stable backend identifier used by `agent_chat` startup selection.
pub const HTTP_BACKEND_ID: &str = "http";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration for the HTTP backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpBackendConfig {
    pub base_url: Option<String>,
    /// Upper bound for one `/chat` or `/human-feedback` exchange.
    pub turn_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl HttpBackendConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    fn into_api_config(self) -> AgentApiConfig {
        let mut config = AgentApiConfig::default().with_connect_timeout(CONNECT_TIMEOUT);

        if let Some(base_url) = self.base_url {
            config = config.with_base_url(base_url);
        }

        if let Some(timeout) = self.turn_timeout {
            config = config.with_request_timeout(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            config = config.with_user_agent(user_agent);
        }

        config
    }
}

trait TransportClient: Send + Sync {
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentApiError>;

    fn feedback(
        &self,
        request: &agent_api::FeedbackRequest,
    ) -> Result<FeedbackResponse, AgentApiError>;

    fn stream(
        &self,
        query: &str,
        thread_id: &str,
        cancel: &CancelSignal,
        on_event: &mut dyn FnMut(AgentStreamEvent),
    ) -> Result<StreamEnd, AgentApiError>;
}

#[derive(Debug)]
struct DefaultTransportClient {
    client: AgentApiClient,
}

impl DefaultTransportClient {
    fn runtime() -> Result<tokio::runtime::Runtime, AgentApiError> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                AgentApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })
    }
}

impl TransportClient for DefaultTransportClient {
    fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentApiError> {
        Self::runtime()?.block_on(self.client.submit_chat(request, None))
    }

    fn feedback(
        &self,
        request: &agent_api::FeedbackRequest,
    ) -> Result<FeedbackResponse, AgentApiError> {
        Self::runtime()?.block_on(self.client.submit_feedback(request, None))
    }

    fn stream(
        &self,
        query: &str,
        thread_id: &str,
        cancel: &CancelSignal,
        on_event: &mut dyn FnMut(AgentStreamEvent),
    ) -> Result<StreamEnd, AgentApiError> {
        Self::runtime()?.block_on(self.client.stream_with_handler(
            query,
            thread_id,
            Some(cancel),
            |event| on_event(event),
        ))
    }
}

/// `AgentBackend` adapter backed by `agent_api` transport primitives.
pub struct HttpBackend {
    endpoint: String,
    transport: Arc<dyn TransportClient>,
}

impl HttpBackend {
    /// Creates a backend using real HTTP transport.
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendInitError> {
        let client = AgentApiClient::new(config.into_api_config()).map_err(map_init_error)?;
        let endpoint = client.base_url();

        Ok(Self {
            endpoint,
            transport: Arc::new(DefaultTransportClient { client }),
        })
    }

    #[cfg(test)]
    fn with_transport_for_tests(transport: Arc<dyn TransportClient>) -> Self {
        Self {
            endpoint: "http://test.invalid".to_string(),
            transport,
        }
    }
}

impl AgentBackend for HttpBackend {
    fn profile(&self) -> BackendProfile {
        BackendProfile {
            backend_id: HTTP_BACKEND_ID.to_string(),
            endpoint: Some(self.endpoint.clone()),
        }
    }

    fn submit_query(&self, req: QueryRequest) -> TurnOutcome {
        let request = ChatRequest::new(req.query, req.session_id.as_str());

        match self.transport.chat(&request) {
            Ok(response) => map_chat_response(response),
            Err(error) => {
                tracing::warn!(thread_id = %req.session_id, %error, "chat request failed");
                TurnOutcome::Failed {
                    reason: format!("agent request failed: {error}"),
                }
            }
        }
    }

    fn submit_feedback(&self, req: FeedbackRequest) -> FeedbackOutcome {
        let request = agent_api::FeedbackRequest::new(req.session_id.as_str(), req.feedback);

        match self.transport.feedback(&request) {
            Ok(FeedbackResponse {
                response: Some(text),
                ..
            }) => FeedbackOutcome::Answered { text },
            Ok(_) => FeedbackOutcome::Failed {
                reason: "feedback response is missing the 'response' field".to_string(),
            },
            Err(error) => {
                tracing::warn!(thread_id = %req.session_id, %error, "feedback request failed");
                FeedbackOutcome::Failed {
                    reason: format!("feedback request failed: {error}"),
                }
            }
        }
    }

    fn stream_logs(
        &self,
        req: LogStreamRequest,
        cancel: CancelSignal,
        emit: &mut dyn FnMut(LogStreamEvent),
    ) -> Result<(), String> {
        let mut forward = |event: AgentStreamEvent| match event {
            AgentStreamEvent::Log { content } => emit(LogStreamEvent::Log { content }),
            AgentStreamEvent::Done { .. } => emit(LogStreamEvent::Done),
        };

        match self
            .transport
            .stream(&req.query, req.session_id.as_str(), &cancel, &mut forward)
        {
            Ok(end) => {
                tracing::debug!(thread_id = %req.session_id, ?end, "log stream ended");
                Ok(())
            }
            Err(AgentApiError::Cancelled) => Ok(()),
            Err(error) => Err(format!("log stream failed: {error}")),
        }
    }
}

fn map_chat_response(response: ChatResponse) -> TurnOutcome {
    if response.is_paused() {
        return TurnOutcome::Paused;
    }

    match response.response {
        Some(text) => TurnOutcome::Answered { text },
        None => TurnOutcome::Failed {
            reason: "chat response is missing the 'response' field".to_string(),
        },
    }
}

fn map_init_error(error: AgentApiError) -> BackendInitError {
    BackendInitError::new(format!("Failed to initialize http backend: {error}"))
}
