use serde::Serialize;

/// A validated, non-empty task description bound for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    task: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaskRequestError {
    #[error("task must not be empty")]
    Empty,
}

impl TaskRequest {
    pub fn new(task: impl Into<String>) -> Result<Self, TaskRequestError> {
        let task = task.into();
        if task.is_empty() {
            return Err(TaskRequestError::Empty);
        }
        Ok(Self { task })
    }

    pub fn as_str(&self) -> &str {
        &self.task
    }
}

/// Outcome of one backend run, relayed to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }

    /// The text shown to the caller as `details`.
    pub fn details(&self) -> &str {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or_default()
    }
}
