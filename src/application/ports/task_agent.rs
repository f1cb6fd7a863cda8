use std::sync::Arc;

use async_trait::async_trait;

use crate::application::services::BackendSettings;

#[async_trait]
pub trait TaskAgent: Send + Sync {
    /// Runs one natural-language task and returns the agent's result message.
    async fn run(&self, task: &str) -> Result<String, BackendError>;
}

/// Builds the agent a backend session wraps.
pub trait AgentFactory: Send + Sync {
    fn create(&self, settings: &BackendSettings) -> Result<Arc<dyn TaskAgent>, BackendError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("invalid backend configuration: {0}")]
    InvalidConfig(String),
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("task execution timed out after {0}s")]
    Timeout(u64),
}
