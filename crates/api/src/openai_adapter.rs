//! OpenAI chat-completions wire format
//!
//! Two encoders share one [`ResponseEnvelope`] per request: the non-streaming
//! builder ([`chat_completion_response`]) and the SSE encoders
//! ([`sse_chat_completions`] for live agent deltas, [`sse_text_chunks`] for
//! plain text chunks). Every SSE sequence ends with exactly one `[DONE]` frame.

use crate::models::ErrorResponse;
use axum::response::sse::Event;
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use services::agent::aggregator::THINKING_SECTION_MARKER;
use services::{AgentError, NormalizedDelta, ToolCallDescriptor};
use std::fmt;
use utoipa::ToSchema;

pub const CHAT_COMPLETION_OBJECT: &str = "chat.completion";
pub const CHAT_COMPLETION_CHUNK_OBJECT: &str = "chat.completion.chunk";
pub const DONE_MARKER: &str = "[DONE]";

/// Fields shared by every payload of one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResponseEnvelope {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
}

impl ResponseEnvelope {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            id: format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
            object: CHAT_COMPLETION_OBJECT.to_string(),
            created: chrono::Utc::now().timestamp(),
            model: model.into(),
        }
    }

    fn chunk_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!(self.id));
        fields.insert("object".to_string(), json!(CHAT_COMPLETION_CHUNK_OBJECT));
        fields.insert("created".to_string(), json!(self.created));
        fields.insert("model".to_string(), json!(self.model));
        fields
    }
}

/// Content of a non-streaming answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FinalContent {
    Text(String),
    /// A single pre-shaped content block, passed through as is
    Block(Value),
    /// Several pre-shaped content blocks, in order
    Blocks(Vec<Value>),
}

impl FinalContent {
    /// Text chunks are joined; one structured chunk passes through alone,
    /// otherwise the chunks are kept as an ordered list.
    pub fn from_chunks(mut chunks: Vec<Value>) -> Self {
        if chunks.iter().all(Value::is_string) {
            return Self::Text(chunks.iter().filter_map(Value::as_str).collect());
        }
        if chunks.len() == 1 {
            return Self::Block(chunks.remove(0));
        }
        Self::Blocks(chunks)
    }
}

impl From<String> for FinalContent {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Token counters; never populated by this service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Usage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssistantMessage {
    pub role: String,
    #[schema(value_type = Object)]
    pub content: FinalContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatChoice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
    /// Prompt texts of the request, for traceability
    pub prompt: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionResponse {
    #[serde(flatten)]
    pub envelope: ResponseEnvelope,
    pub usage: Usage,
    pub choices: Vec<ChatChoice>,
}

/// Build the single JSON response of a non-streaming request.
pub fn chat_completion_response(
    envelope: &ResponseEnvelope,
    content: impl Into<FinalContent>,
    prompt: Vec<String>,
) -> ChatCompletionResponse {
    ChatCompletionResponse {
        envelope: ResponseEnvelope {
            object: CHAT_COMPLETION_OBJECT.to_string(),
            ..envelope.clone()
        },
        usage: Usage::default(),
        choices: vec![ChatChoice {
            index: 0,
            message: AssistantMessage {
                role: "assistant".to_string(),
                content: content.into(),
            },
            finish_reason: "stop".to_string(),
            prompt,
        }],
    }
}

fn tool_call(descriptor: &ToolCallDescriptor) -> Value {
    json!({
        "id": descriptor.id,
        "type": "function",
        "function": {
            "name": descriptor.name,
            "arguments": descriptor.arguments,
        }
    })
}

/// Encode one live delta as a chunk payload.
///
/// Pre-shaped chunks keep their own keys (including `choices`); the envelope
/// only fills in keys they lack.
pub fn encode_delta(envelope: &ResponseEnvelope, delta: &NormalizedDelta) -> Value {
    let (delta, finish_reason) = match delta {
        NormalizedDelta::PreShaped(chunk) => {
            let mut payload = chunk.clone();
            for (key, value) in envelope.chunk_fields() {
                payload.entry(key).or_insert(value);
            }
            return Value::Object(payload);
        }
        NormalizedDelta::ThinkingStarted => (json!({"content": THINKING_SECTION_MARKER}), Value::Null),
        NormalizedDelta::Thinking(text) => (json!({"thinking": text, "content": text}), Value::Null),
        NormalizedDelta::Content(text) => (json!({"content": text}), Value::Null),
        NormalizedDelta::ToolCalls(calls) => (
            json!({"tool_calls": calls.iter().map(tool_call).collect::<Vec<_>>()}),
            Value::Null,
        ),
        NormalizedDelta::ToolResult {
            tool_call_id,
            content,
        } => (
            json!({"role": "tool", "tool_call_id": tool_call_id, "content": content}),
            Value::Null,
        ),
        NormalizedDelta::Finish => (json!({}), json!("stop")),
    };

    let mut payload = envelope.chunk_fields();
    payload.insert(
        "choices".to_string(),
        json!([{"index": 0, "delta": delta, "finish_reason": finish_reason}]),
    );
    Value::Object(payload)
}

/// One `data:` frame of an SSE response
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    Data(Value),
    Done,
}

impl SseFrame {
    pub fn data(&self) -> String {
        match self {
            Self::Data(value) => value.to_string(),
            Self::Done => DONE_MARKER.to_string(),
        }
    }

    pub fn into_event(self) -> Event {
        Event::default().data(self.data())
    }
}

impl fmt::Display for SseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data: {}\n\n", self.data())
    }
}

fn error_frame(error: &AgentError) -> SseFrame {
    let (_, body) = ErrorResponse::from_agent_error(error);
    SseFrame::Data(json!(body))
}

/// Encode a live delta stream. A failure becomes an error frame; the
/// sequence always closes with `[DONE]`, even when the source is empty.
pub fn sse_chat_completions<S>(
    deltas: S,
    envelope: ResponseEnvelope,
) -> impl Stream<Item = SseFrame> + Send
where
    S: Stream<Item = Result<NormalizedDelta, AgentError>> + Send,
{
    deltas
        .map(move |item| match item {
            Ok(delta) => SseFrame::Data(encode_delta(&envelope, &delta)),
            Err(e) => {
                tracing::error!(error = %e, "Agent stream failed");
                error_frame(&e)
            }
        })
        .chain(stream::once(async { SseFrame::Done }))
}

/// Encode already-materialized text chunks as content deltas.
pub fn sse_text_chunks<I>(chunks: I, envelope: &ResponseEnvelope) -> Vec<SseFrame>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    chunks
        .into_iter()
        .map(|chunk| {
            SseFrame::Data(encode_delta(
                envelope,
                &NormalizedDelta::Content(chunk.into()),
            ))
        })
        .chain(std::iter::once(SseFrame::Done))
        .collect()
}
