use crate::tools::ToolError;
use async_trait::async_trait;
use futures::Stream;
use inference_providers::{Message, ProviderError};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

/// Stream of normalized deltas produced in live mode
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<NormalizedDelta, AgentError>> + Send>>;

/// Tool call descriptor surfaced to clients while streaming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallDescriptor {
    pub id: String,
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

/// A finalized tool-use block awaiting execution
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

impl ToolRequest {
    pub fn descriptor(&self) -> ToolCallDescriptor {
        ToolCallDescriptor {
            id: self.id.clone(),
            name: self.name.clone(),
            arguments: self.arguments.to_string(),
        }
    }
}

/// Output of one tool execution, fed back to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub content: String,
}

/// Provider-agnostic output unit of the agent loop
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedDelta {
    /// Marks the beginning of a thinking section.
    ThinkingStarted,
    Thinking(String),
    Content(String),
    ToolCalls(Vec<ToolCallDescriptor>),
    ToolResult {
        tool_call_id: String,
        content: String,
    },
    /// Terminal marker; always the last delta of a successful request.
    Finish,
    /// Chunk already shaped as an OpenAI completion chunk (carries `choices`).
    PreShaped(serde_json::Map<String, serde_json::Value>),
}

/// Per-agent settings resolved from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub system_prompt: Option<String>,
    pub thinking_budget: Option<u32>,
    pub include_tool_logs: bool,
    pub max_rounds: Option<usize>,
    pub round_timeout: Option<Duration>,
}

impl AgentSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: normalize_model(&model.into()),
            max_output_tokens: 1024,
            temperature: 0.0,
            system_prompt: None,
            thinking_budget: None,
            include_tool_logs: true,
            max_rounds: Some(16),
            round_timeout: None,
        }
    }

    pub fn from_config(config: &config::AgentConfig) -> Self {
        Self {
            model: normalize_model(&config.model),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
            system_prompt: Some(config.system_prompt.clone()).filter(|p| !p.trim().is_empty()),
            thinking_budget: config.thinking_budget(),
            include_tool_logs: config.include_tool_logs,
            max_rounds: config.max_rounds,
            round_timeout: config.round_timeout_seconds.map(Duration::from_secs),
        }
    }
}

/// Strip a provider routing prefix such as `anthropic:` from a model id.
pub fn normalize_model(model: &str) -> String {
    model
        .strip_prefix("anthropic:")
        .unwrap_or(model)
        .to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("Model round timed out after {0:?}")]
    RoundTimeout(Duration),
    #[error("Response consumer disconnected")]
    ConsumerDisconnected,
}

/// What the HTTP layer talks to: one conversation per call.
#[async_trait]
pub trait ChatAgent: Send + Sync {
    /// Model id reported in responses
    fn model(&self) -> &str;

    /// Collected mode: run the full loop and return the composed answer.
    async fn ask(&self, messages: Vec<Message>) -> Result<String, AgentError>;

    /// Live mode: stream normalized deltas as they are produced.
    fn ask_stream(&self, messages: Vec<Message>) -> DeltaStream;
}

/// Builds an agent per request
pub trait AgentFactory: Send + Sync {
    fn create(&self, simulate: Option<bool>) -> Result<Arc<dyn ChatAgent>, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_model_strips_provider_prefix() {
        assert_eq!(normalize_model("anthropic:claude-sonnet-4-5"), "claude-sonnet-4-5");
        assert_eq!(normalize_model("claude-sonnet-4-5"), "claude-sonnet-4-5");
    }

    #[test]
    fn test_tool_request_descriptor_encodes_arguments() {
        let request = ToolRequest {
            id: "toolu_1".to_string(),
            name: "echo".to_string(),
            arguments: json!({"x": 1}),
        };

        let descriptor = request.descriptor();
        assert_eq!(descriptor.name, "echo");
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&descriptor.arguments).unwrap(),
            json!({"x": 1})
        );
    }

    #[test]
    fn test_settings_from_config() {
        let config = config::AgentConfig {
            model: "anthropic:claude-haiku-4-5".to_string(),
            thinking_enabled: true,
            round_timeout_seconds: Some(30),
            system_prompt: "  ".to_string(),
            ..Default::default()
        };

        let settings = AgentSettings::from_config(&config);
        assert_eq!(settings.model, "claude-haiku-4-5");
        assert_eq!(settings.thinking_budget, Some(1024));
        assert_eq!(settings.round_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.system_prompt, None);
    }
}
