mod asr_provider;
mod task_agent;

pub use asr_provider::{AsrError, AsrProvider, AudioSource, JobOutcome};
pub use task_agent::{AgentFactory, BackendError, TaskAgent};
