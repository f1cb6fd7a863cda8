use std::sync::Arc;
use std::time::Duration;

use super::echo_agent::EchoAgent;
use super::openai_agent_client::OpenAiAgentClient;
use crate::application::ports::{AgentFactory, BackendError, TaskAgent};
use crate::application::services::BackendSettings;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentProvider {
    Http,
    Echo { delay_ms: u64 },
}

pub struct TaskAgentFactory {
    provider: AgentProvider,
}

impl TaskAgentFactory {
    pub fn new(provider: AgentProvider) -> Self {
        Self { provider }
    }
}

impl AgentFactory for TaskAgentFactory {
    fn create(&self, settings: &BackendSettings) -> Result<Arc<dyn TaskAgent>, BackendError> {
        match self.provider {
            AgentProvider::Http => {
                if settings.model.base_url.trim().is_empty() {
                    return Err(BackendError::InvalidConfig(
                        "agent base URL must not be empty".to_string(),
                    ));
                }
                Ok(Arc::new(OpenAiAgentClient::new(settings)))
            }
            AgentProvider::Echo { delay_ms } => {
                Ok(Arc::new(EchoAgent::new(Duration::from_millis(delay_ms))))
            }
        }
    }
}
