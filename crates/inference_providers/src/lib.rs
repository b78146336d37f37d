//! Inference providers crate for streaming model rounds from reasoning backends
//!
//! A provider turns one [`MessageRequest`] into a [`MessageStream`]: a
//! per-round session yielding a closed set of [`StreamEvent`]s (block start,
//! block delta, block stop) followed by the provider's authoritative
//! [`FinalMessage`] for the round.
//!
//! # Usage
//!
//! ```rust,ignore
//! use inference_providers::{ReasoningProvider, MessageRequest, Message, StreamEvent};
//!
//! async fn example<P: ReasoningProvider>(provider: P) -> Result<(), ProviderError> {
//!     let request = MessageRequest {
//!         model: "claude-sonnet-4-5".to_string(),
//!         max_tokens: 1024,
//!         temperature: 0.0,
//!         messages: vec![Message::user("2+2?")],
//!         tools: vec![],
//!         system: None,
//!         thinking: None,
//!     };
//!
//!     let mut stream = provider.stream_message(request).await?;
//!     while let Some(event) = stream.next_event().await {
//!         if let StreamEvent::BlockDelta { delta, .. } = event? {
//!             println!("{delta:?}");
//!         }
//!     }
//!     let message = stream.final_message().await?;
//!     println!("{} blocks", message.content.len());
//!     Ok(())
//! }
//! ```

pub mod anthropic;
pub mod mock;
pub mod models;
pub mod sse_parser;
pub mod stream;

use async_trait::async_trait;

// Re-export commonly used types for convenience
pub use anthropic::{AnthropicConfig, AnthropicProvider};
pub use mock::{MockProvider, ScriptedRound};
pub use models::{
    BlockDelta, BlockKind, ContentBlock, FinalMessage, Message, MessageContent, MessageRequest,
    MessageRole, ProviderError, StreamEvent, ThinkingConfig, ToolDefinition,
};
pub use stream::{EventStream, MessageStream};

#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Opens a streaming session for one model round.
    ///
    /// Errors returned here happen before any event was produced (transport
    /// failures, non-success HTTP statuses). Errors during the stream are
    /// yielded by the session itself.
    async fn stream_message(&self, request: MessageRequest) -> Result<MessageStream, ProviderError>;
}
