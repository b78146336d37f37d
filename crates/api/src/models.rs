use axum::http::StatusCode;
use inference_providers::Message;
use serde::{Deserialize, Serialize};
use services::AgentError;
use utoipa::ToSchema;

// ============================================
// Request Models
// ============================================

/// One turn of the incoming conversation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// Role of the message sender (e.g. `user`, `assistant`, `system`)
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn is_user(&self) -> bool {
        self.role.eq_ignore_ascii_case("user")
    }

    fn to_message(&self) -> Message {
        match self.role.to_ascii_lowercase().as_str() {
            "assistant" => Message::assistant(self.content.clone()),
            "system" | "developer" => Message::system(self.content.clone()),
            _ => Message::user(self.content.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default = "default_stream")]
    pub stream: bool,
    /// Answer with a canned response instead of calling the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulate: Option<bool>,
    /// Accepted for client compatibility; the configured model is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn default_stream() -> bool {
    true
}

impl ChatCompletionRequest {
    /// Content of the most recent user message, when it is non-empty
    pub fn latest_user_question(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_user())
            .map(|m| m.content.as_str())
            .filter(|content| !content.trim().is_empty())
    }

    pub fn conversation(&self) -> Vec<Message> {
        self.messages.iter().map(ChatMessage::to_message).collect()
    }

    /// Original prompt texts, echoed back in non-streaming responses
    pub fn prompt_texts(&self) -> Vec<String> {
        self.messages.iter().map(|m| m.content.clone()).collect()
    }
}

// ============================================
// Error Models
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: String, error_type: String) -> Self {
        Self {
            error: ErrorDetail {
                message,
                r#type: error_type,
                param: None,
                code: None,
            },
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(message.into(), "invalid_request_error".to_string())
    }

    /// Body and HTTP status for an agent failure
    pub fn from_agent_error(error: &AgentError) -> (StatusCode, Self) {
        let (status, error_type) = match error {
            AgentError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
            AgentError::Provider(_) => (StatusCode::BAD_GATEWAY, "provider_error"),
            AgentError::Tool(_) => (StatusCode::BAD_GATEWAY, "tool_error"),
            AgentError::RoundTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error"),
            AgentError::ConsumerDisconnected => {
                (StatusCode::INTERNAL_SERVER_ERROR, "client_disconnected")
            }
        };
        (status, Self::new(error.to_string(), error_type.to_string()))
    }
}
