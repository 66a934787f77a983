use std::sync::Arc;

use agent_backend::{AgentBackend, BackendInitError};
use agent_backend_http::{HttpBackend, HttpBackendConfig, HTTP_BACKEND_ID};
use agent_backend_mock::MockBackend;

use crate::config::{BackendKind, EnvConfig};

pub const DEFAULT_BACKEND_ID: &str = HTTP_BACKEND_ID;

pub fn backend_from_config(config: &EnvConfig) -> Result<Arc<dyn AgentBackend>, BackendInitError> {
    let backend: Arc<dyn AgentBackend> = match config.backend {
        BackendKind::Http => {
            let mut http_config = HttpBackendConfig::new().with_turn_timeout(config.turn_timeout);
            if let Some(base_url) = config.base_url.as_deref() {
                http_config = http_config.with_base_url(base_url);
            }
            Arc::new(HttpBackend::new(http_config)?)
        }
        BackendKind::Mock => Arc::new(MockBackend::default()),
    };

    let profile = backend.profile();
    tracing::info!(
        backend = %profile.backend_id,
        endpoint = profile.endpoint.as_deref().unwrap_or("-"),
        "agent backend selected"
    );
    Ok(backend)
}
