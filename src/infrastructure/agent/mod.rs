mod agent_factory;
mod echo_agent;
mod openai_agent_client;

pub use agent_factory::{AgentProvider, TaskAgentFactory};
pub use echo_agent::EchoAgent;
pub use openai_agent_client::OpenAiAgentClient;
