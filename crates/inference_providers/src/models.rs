use serde::{Deserialize, Serialize};

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A single conversation turn sent to the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: MessageContent,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Assistant turn carrying the full content blocks of a model round
    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// User turn carrying tool results, in request order
    pub fn tool_results(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// Concatenated text of the message, ignoring non-text blocks
    pub fn text(&self) -> String {
        match &self.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|block| match block {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Message content - can be a plain string or an array of content blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Thinking {
        thinking: String,
        #[serde(default)]
        signature: String,
    },
    RedactedThinking {
        data: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn kind(&self) -> Option<BlockKind> {
        match self {
            Self::Text { .. } => Some(BlockKind::Text),
            Self::Thinking { .. } => Some(BlockKind::Thinking),
            Self::RedactedThinking { .. } => Some(BlockKind::RedactedThinking),
            Self::ToolUse { .. } => Some(BlockKind::ToolUse),
            Self::ToolResult { .. } => None,
        }
    }
}

/// Declared type of a streamed content block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Thinking,
    RedactedThinking,
    ToolUse,
}

/// Incremental payload of a streamed content block
#[derive(Debug, Clone, PartialEq)]
pub enum BlockDelta {
    Text(String),
    Thinking(String),
    /// Fragment of a tool-use block's JSON arguments; only complete at block stop.
    InputJson(String),
    Signature(String),
}

/// Provider stream events, indexed by content block position
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    BlockStart {
        index: u32,
        kind: BlockKind,
    },
    BlockDelta {
        index: u32,
        delta: BlockDelta,
    },
    /// `block` is the finalized block when the provider has assembled it.
    BlockStop {
        index: u32,
        block: Option<ContentBlock>,
    },
}

/// The provider's authoritative aggregate of one model round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalMessage {
    pub content: Vec<ContentBlock>,
    /// Stream index of each block in `content`; empty means positional
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_indices: Vec<u32>,
}

impl FinalMessage {
    pub fn new(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            block_indices: Vec::new(),
        }
    }

    /// Message assembled from blocks keyed by their stream index
    pub fn indexed(blocks: impl IntoIterator<Item = (u32, ContentBlock)>) -> Self {
        let (block_indices, content) = blocks.into_iter().unzip();
        Self {
            content,
            block_indices,
        }
    }

    /// Stream index of the block at `position`
    pub fn block_index(&self, position: usize) -> u32 {
        self.block_indices
            .get(position)
            .copied()
            .unwrap_or(position as u32)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThinkingConfig {
    Enabled { budget_tokens: u32 },
}

/// One model round request
#[derive(Debug, Clone, PartialEq)]
pub struct MessageRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub system: Option<String>,
    pub thinking: Option<ThinkingConfig>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider configuration error: {0}")]
    Configuration(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("HTTP {status_code}: {message}")]
    HttpError { status_code: u16, message: String },
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
    #[error("Provider error ({error_type}): {message}")]
    Api { error_type: String, message: String },
    #[error("No scripted response left")]
    Exhausted,
}
