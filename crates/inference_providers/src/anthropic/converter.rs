//! Anthropic format converter
//!
//! This module handles:
//! - Request conversion (provider-neutral `MessageRequest` → Anthropic wire format)
//! - Streaming event parsing (Anthropic SSE payloads → `StreamEvent`)
//! - Per-block accumulation so finalized blocks are attached at block stop

use crate::{
    sse_parser::SseEventParser, BlockDelta, BlockKind, ContentBlock, Message, MessageContent,
    MessageRequest, MessageRole, ProviderError, StreamEvent, ThinkingConfig, ToolDefinition,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Anthropic Request Types
// =============================================================================

/// Anthropic message format for requests
#[derive(Debug, Clone, Serialize)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: MessageContent,
}

/// System prompt block
#[derive(Debug, Clone, Serialize)]
pub struct AnthropicSystemBlock {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub text: String,
}

/// Anthropic request format
#[derive(Debug, Clone, Serialize)]
pub struct AnthropicRequest {
    pub model: String,
    pub messages: Vec<AnthropicMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<Vec<AnthropicSystemBlock>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<ThinkingConfig>,
    pub stream: bool,
}

// =============================================================================
// Anthropic Response Types (Streaming)
// =============================================================================

/// Streaming event types from Anthropic
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum AnthropicStreamEvent {
    #[serde(rename = "message_start")]
    MessageStart { message: AnthropicMessageInfo },
    #[serde(rename = "content_block_start")]
    ContentBlockStart {
        index: u32,
        content_block: AnthropicContentBlock,
    },
    #[serde(rename = "content_block_delta")]
    ContentBlockDelta { index: u32, delta: AnthropicDelta },
    #[serde(rename = "content_block_stop")]
    ContentBlockStop { index: u32 },
    #[serde(rename = "message_delta")]
    MessageDelta { delta: AnthropicMessageDelta },
    #[serde(rename = "message_stop")]
    MessageStop,
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "error")]
    Error { error: AnthropicError },
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicMessageInfo {
    pub id: String,
    #[serde(default)]
    pub model: Option<String>,
}

/// Content block in streaming responses (uses struct for forward compatibility)
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicContentBlock {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Option<serde_json::Value>,
}

impl AnthropicContentBlock {
    pub fn kind(&self) -> Option<BlockKind> {
        match self.type_.as_str() {
            "text" => Some(BlockKind::Text),
            "thinking" => Some(BlockKind::Thinking),
            "redacted_thinking" => Some(BlockKind::RedactedThinking),
            "tool_use" => Some(BlockKind::ToolUse),
            _ => None,
        }
    }
}

/// Delta in streaming responses
#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicDelta {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub thinking: Option<String>,
    #[serde(default)]
    pub partial_json: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

impl AnthropicDelta {
    /// Map to the provider-neutral payload. A `thinking` field wins over the tag.
    pub fn into_block_delta(self) -> Option<BlockDelta> {
        if let Some(thinking) = self.thinking {
            return Some(BlockDelta::Thinking(thinking));
        }
        match self.type_.as_str() {
            "text_delta" => self.text.map(BlockDelta::Text),
            "thinking_delta" => self.text.map(BlockDelta::Thinking),
            "input_json_delta" => self.partial_json.map(BlockDelta::InputJson),
            "signature_delta" => self.signature.map(BlockDelta::Signature),
            _ => self.text.map(BlockDelta::Text),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicMessageDelta {
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnthropicError {
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
}

// =============================================================================
// Conversion Functions
// =============================================================================

/// Split system turns out of the conversation and convert the rest.
///
/// The configured system prompt comes first, followed by any system turns
/// found in the conversation.
pub fn convert_messages(
    system_prompt: Option<&str>,
    messages: &[Message],
) -> (Option<Vec<AnthropicSystemBlock>>, Vec<AnthropicMessage>) {
    let mut system_parts: Vec<String> = system_prompt
        .filter(|s| !s.trim().is_empty())
        .map(|s| vec![s.to_string()])
        .unwrap_or_default();
    let mut converted = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            MessageRole::System => {
                let text = message.text();
                if !text.trim().is_empty() {
                    system_parts.push(text);
                }
            }
            MessageRole::User => converted.push(AnthropicMessage {
                role: "user".to_string(),
                content: message.content.clone(),
            }),
            MessageRole::Assistant => converted.push(AnthropicMessage {
                role: "assistant".to_string(),
                content: message.content.clone(),
            }),
        }
    }

    let system = (!system_parts.is_empty()).then(|| {
        vec![AnthropicSystemBlock {
            type_: "text",
            text: system_parts.join("\n\n"),
        }]
    });

    (system, converted)
}

pub fn build_request(request: &MessageRequest) -> AnthropicRequest {
    let (system, messages) = convert_messages(request.system.as_deref(), &request.messages);

    // Extended thinking only accepts the default temperature
    let temperature = match request.thinking {
        Some(_) => None,
        None => Some(request.temperature.clamp(0.0, 1.0)),
    };

    AnthropicRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
        system,
        temperature,
        tools: request.tools.clone(),
        thinking: request.thinking,
        stream: true,
    }
}

// =============================================================================
// Streaming Parser State & Implementation
// =============================================================================

/// Content block being accumulated during streaming
#[derive(Debug, Clone)]
enum BlockBuilder {
    Text(String),
    Thinking { thinking: String, signature: String },
    RedactedThinking(String),
    ToolUse {
        id: String,
        name: String,
        json_buffer: String,
        initial_input: Option<serde_json::Value>,
    },
}

impl BlockBuilder {
    fn from_start(block: AnthropicContentBlock) -> Option<Self> {
        match block.kind()? {
            BlockKind::Text => Some(Self::Text(block.text.unwrap_or_default())),
            BlockKind::Thinking => Some(Self::Thinking {
                thinking: block.thinking.unwrap_or_default(),
                signature: block.signature.unwrap_or_default(),
            }),
            BlockKind::RedactedThinking => {
                Some(Self::RedactedThinking(block.data.unwrap_or_default()))
            }
            BlockKind::ToolUse => Some(Self::ToolUse {
                id: block.id.unwrap_or_default(),
                name: block.name.unwrap_or_default(),
                json_buffer: String::new(),
                initial_input: block
                    .input
                    .filter(|v| v.as_object().is_some_and(|o| !o.is_empty())),
            }),
        }
    }

    fn apply(&mut self, delta: &BlockDelta) {
        match (self, delta) {
            (Self::Text(text), BlockDelta::Text(fragment)) => text.push_str(fragment),
            (Self::Thinking { thinking, .. }, BlockDelta::Thinking(fragment)) => {
                thinking.push_str(fragment)
            }
            (Self::Thinking { signature, .. }, BlockDelta::Signature(fragment)) => {
                signature.push_str(fragment)
            }
            (Self::ToolUse { json_buffer, .. }, BlockDelta::InputJson(fragment)) => {
                json_buffer.push_str(fragment)
            }
            _ => {}
        }
    }

    fn finish(self) -> Result<ContentBlock, ProviderError> {
        Ok(match self {
            Self::Text(text) => ContentBlock::Text { text },
            Self::Thinking {
                thinking,
                signature,
            } => ContentBlock::Thinking {
                thinking,
                signature,
            },
            Self::RedactedThinking(data) => ContentBlock::RedactedThinking { data },
            Self::ToolUse {
                id,
                name,
                json_buffer,
                initial_input,
            } => {
                let input = if json_buffer.trim().is_empty() {
                    initial_input.unwrap_or_else(|| serde_json::json!({}))
                } else {
                    serde_json::from_str(&json_buffer).map_err(|e| {
                        ProviderError::InvalidResponse(format!(
                            "Malformed arguments for tool `{name}`: {e}"
                        ))
                    })?
                };
                ContentBlock::ToolUse { id, name, input }
            }
        })
    }
}

/// Anthropic event parser with per-round block state
#[derive(Debug, Default)]
pub struct AnthropicEventParser {
    pub message_id: Option<String>,
    pub stop_reason: Option<String>,
    blocks: HashMap<u32, BlockBuilder>,
}

impl AnthropicEventParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SseEventParser for AnthropicEventParser {
    type Item = StreamEvent;

    fn parse_data(&mut self, data: &str) -> Result<Vec<StreamEvent>, ProviderError> {
        let event: AnthropicStreamEvent = serde_json::from_str(data).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse event: {e}"))
        })?;

        match event {
            AnthropicStreamEvent::MessageStart { message } => {
                tracing::debug!(message_id = %message.id, model = ?message.model, "Anthropic message started");
                self.message_id = Some(message.id);
                Ok(vec![])
            }

            AnthropicStreamEvent::ContentBlockStart {
                index,
                content_block,
            } => {
                let Some(kind) = content_block.kind() else {
                    tracing::debug!(index, block_type = %content_block.type_, "Ignoring unknown block type");
                    return Ok(vec![]);
                };
                if let Some(builder) = BlockBuilder::from_start(content_block) {
                    self.blocks.insert(index, builder);
                }
                Ok(vec![StreamEvent::BlockStart { index, kind }])
            }

            AnthropicStreamEvent::ContentBlockDelta { index, delta } => {
                let Some(delta) = delta.into_block_delta() else {
                    return Ok(vec![]);
                };
                if let Some(builder) = self.blocks.get_mut(&index) {
                    builder.apply(&delta);
                }
                Ok(vec![StreamEvent::BlockDelta { index, delta }])
            }

            AnthropicStreamEvent::ContentBlockStop { index } => {
                let block = self
                    .blocks
                    .remove(&index)
                    .map(BlockBuilder::finish)
                    .transpose()?;
                Ok(vec![StreamEvent::BlockStop { index, block }])
            }

            AnthropicStreamEvent::MessageDelta { delta } => {
                self.stop_reason = delta.stop_reason;
                Ok(vec![])
            }

            AnthropicStreamEvent::Error { error } => {
                tracing::warn!(backend = "anthropic", error_type = %error.type_, "Stream error received");
                Err(ProviderError::Api {
                    error_type: error.type_,
                    message: error.message,
                })
            }

            AnthropicStreamEvent::MessageStop | AnthropicStreamEvent::Ping => Ok(vec![]),
        }
    }
}
