use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::application::ports::{AgentFactory, BackendError, TaskAgent};
use crate::domain::{TaskRequest, TaskResult};

pub const BASE_URL_VAR: &str = "PHONE_AGENT_BASE_URL";
pub const MODEL_VAR: &str = "PHONE_AGENT_MODEL";
pub const API_KEY_VAR: &str = "PHONE_AGENT_API_KEY";
pub const MAX_STEPS_VAR: &str = "PHONE_AGENT_MAX_STEPS";
pub const LANG_VAR: &str = "PHONE_AGENT_LANG";
pub const TIMEOUT_VAR: &str = "PHONE_AGENT_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";
const DEFAULT_MODEL: &str = "autoglm-phone-9b";
const DEFAULT_API_KEY: &str = "EMPTY";
const DEFAULT_MAX_STEPS: &str = "100";
const DEFAULT_LANG: &str = "cn";
const DEFAULT_TIMEOUT_SECS: &str = "600";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub base_url: String,
    pub model_name: String,
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub max_steps: u32,
    pub lang: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSettings {
    pub model: ModelConfig,
    pub agent: AgentConfig,
}

impl BackendSettings {
    pub fn from_env() -> Result<Self, BackendError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves every setting through `lookup`, falling back to the documented defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BackendError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let max_steps = parse_number(MAX_STEPS_VAR, &var(MAX_STEPS_VAR, DEFAULT_MAX_STEPS))?;
        let timeout_secs = parse_number(TIMEOUT_VAR, &var(TIMEOUT_VAR, DEFAULT_TIMEOUT_SECS))?;

        Ok(Self {
            model: ModelConfig {
                base_url: var(BASE_URL_VAR, DEFAULT_BASE_URL),
                model_name: var(MODEL_VAR, DEFAULT_MODEL),
                api_key: var(API_KEY_VAR, DEFAULT_API_KEY),
            },
            agent: AgentConfig {
                max_steps: max_steps as u32,
                lang: var(LANG_VAR, DEFAULT_LANG),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, BackendError> {
    let value: u64 = raw.trim().parse().map_err(|_| {
        BackendError::InvalidConfig(format!("{} must be a non-negative integer, got {:?}", key, raw))
    })?;
    if key == MAX_STEPS_VAR && value > u64::from(u32::MAX) {
        return Err(BackendError::InvalidConfig(format!(
            "{} is out of range: {}",
            key, value
        )));
    }
    Ok(value)
}

/// Handle to the task-execution backend, shared read-only by every request.
pub struct BackendSession {
    model_config: ModelConfig,
    agent_config: AgentConfig,
    agent: Arc<dyn TaskAgent>,
}

impl BackendSession {
    pub fn new(settings: BackendSettings, agent: Arc<dyn TaskAgent>) -> Self {
        Self {
            model_config: settings.model,
            agent_config: settings.agent,
            agent,
        }
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    pub fn agent_config(&self) -> &AgentConfig {
        &self.agent_config
    }

    /// Runs the task. Agent failures and timeouts come back as a failed [`TaskResult`].
    pub async fn run(&self, task: &TaskRequest) -> TaskResult {
        let timeout = self.agent_config.timeout;
        tracing::debug!(chars = task.as_str().chars().count(), "Executing task");

        let outcome = match tokio::time::timeout(timeout, self.agent.run(task.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(timeout.as_secs())),
        };

        match outcome {
            Ok(message) => {
                tracing::info!(chars = message.chars().count(), "Task execution completed");
                TaskResult::succeeded(message)
            }
            Err(e) => {
                tracing::error!(error = %e, "Task execution failed");
                TaskResult::failed(format!("Failed to execute task: {}", e))
            }
        }
    }
}

type SettingsSource = dyn Fn() -> Result<BackendSettings, BackendError> + Send + Sync;

/// Builds the [`BackendSession`] on first use and hands out the same instance afterwards.
///
/// Concurrent first callers wait on a single initialisation. A failed initialisation is not
/// cached.
pub struct BackendSessionCell {
    session: OnceCell<Arc<BackendSession>>,
    factory: Arc<dyn AgentFactory>,
    settings_source: Box<SettingsSource>,
}

impl BackendSessionCell {
    pub fn from_env(factory: Arc<dyn AgentFactory>) -> Self {
        Self::with_settings_source(factory, BackendSettings::from_env)
    }

    pub fn with_settings_source<S>(factory: Arc<dyn AgentFactory>, source: S) -> Self
    where
        S: Fn() -> Result<BackendSettings, BackendError> + Send + Sync + 'static,
    {
        Self {
            session: OnceCell::new(),
            factory,
            settings_source: Box::new(source),
        }
    }

    pub async fn get_or_create(&self) -> Result<Arc<BackendSession>, BackendError> {
        let session = self
            .session
            .get_or_try_init(|| async {
                tracing::info!("Initializing backend session");
                let settings = (self.settings_source)()?;
                let agent = self.factory.create(&settings)?;

                tracing::info!(
                    base_url = %settings.model.base_url,
                    model = %settings.model.model_name,
                    max_steps = settings.agent.max_steps,
                    lang = %settings.agent.lang,
                    "Backend session initialized"
                );

                Ok::<_, BackendError>(Arc::new(BackendSession::new(settings, agent)))
            })
            .await?;

        Ok(Arc::clone(session))
    }

    pub fn is_initialized(&self) -> bool {
        self.session.initialized()
    }
}
