use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{BackendError, TaskAgent};

/// Answers every task with `Echo: <task>`. Lets the gateway run without a backend.
pub struct EchoAgent {
    delay: Duration,
}

impl EchoAgent {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl TaskAgent for EchoAgent {
    async fn run(&self, task: &str) -> Result<String, BackendError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(format!("Echo: {}", task))
    }
}
