use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::{BackendError, TaskAgent};
use crate::application::services::BackendSettings;

const SYSTEM_PROMPT_CN: &str = "你是一个手机操作助手。请在不超过{max_steps}步内完成用户交给你的任务，完成后用一句话总结执行结果。";
const SYSTEM_PROMPT_EN: &str = "You are a phone operation assistant. Complete the user's task in at most {max_steps} steps, then summarise the outcome in one sentence.";

/// Task agent reached over an OpenAI-compatible chat completions endpoint.
pub struct OpenAiAgentClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    system_prompt: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiAgentClient {
    pub fn new(settings: &BackendSettings) -> Self {
        let template = match settings.agent.lang.to_ascii_lowercase().as_str() {
            "cn" | "zh" => SYSTEM_PROMPT_CN,
            _ => SYSTEM_PROMPT_EN,
        };

        Self {
            client: Client::new(),
            base_url: settings.model.base_url.trim_end_matches('/').to_string(),
            api_key: settings.model.api_key.clone(),
            model: settings.model.model_name.clone(),
            system_prompt: template.replace("{max_steps}", &settings.agent.max_steps.to_string()),
        }
    }

    fn build_messages(&self, task: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: self.system_prompt.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: task.to_string(),
            },
        ]
    }
}

#[async_trait]
impl TaskAgent for OpenAiAgentClient {
    async fn run(&self, task: &str) -> Result<String, BackendError> {
        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: self.build_messages(task),
        };

        tracing::debug!(model = %self.model, "Sending task to agent backend");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| BackendError::ApiRequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::ApiRequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| BackendError::InvalidResponse("empty choices".to_string()))
    }
}
