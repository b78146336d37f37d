//! Scripted implementation of ReasoningProvider for testing
//!
//! Each call to `stream_message` consumes the next scripted round and records
//! the request it was given, so tests can inspect the conversation sent on
//! every round.

use crate::{
    BlockDelta, BlockKind, ContentBlock, FinalMessage, MessageRequest, MessageStream,
    ProviderError, ReasoningProvider, StreamEvent,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One scripted model round
#[derive(Debug, Clone, Default)]
pub struct ScriptedRound {
    pub events: Vec<StreamEvent>,
    /// Overrides the final message assembled from `BlockStop` events.
    pub final_message: Option<FinalMessage>,
    /// Yielded after `events`, aborting the round.
    pub stream_error: Option<String>,
}

impl ScriptedRound {
    pub fn new(events: Vec<StreamEvent>) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }

    /// A round answering with a single text block streamed in one fragment.
    pub fn text(text: &str) -> Self {
        Self::new(text_block_events(0, &[text]))
    }

    /// A round answering with a single text block streamed in several fragments.
    pub fn text_fragments(fragments: &[&str]) -> Self {
        Self::new(text_block_events(0, fragments))
    }

    /// A round requesting a single tool call.
    pub fn tool_use(id: &str, name: &str, input: serde_json::Value) -> Self {
        Self::new(tool_use_events(0, id, name, input))
    }

    /// A round with a thinking block followed by a text block.
    pub fn thinking_then_text(thinking: &str, text: &str) -> Self {
        let mut events = vec![
            StreamEvent::BlockStart {
                index: 0,
                kind: BlockKind::Thinking,
            },
            StreamEvent::BlockDelta {
                index: 0,
                delta: BlockDelta::Thinking(thinking.to_string()),
            },
            StreamEvent::BlockStop {
                index: 0,
                block: Some(ContentBlock::Thinking {
                    thinking: thinking.to_string(),
                    signature: "mock-signature".to_string(),
                }),
            },
        ];
        events.extend(text_block_events(1, &[text]));
        Self::new(events)
    }

    /// A round whose stream fails after the given events.
    pub fn failing(events: Vec<StreamEvent>, message: &str) -> Self {
        Self {
            events,
            final_message: None,
            stream_error: Some(message.to_string()),
        }
    }

    pub fn with_final_message(mut self, final_message: FinalMessage) -> Self {
        self.final_message = Some(final_message);
        self
    }

    /// Append further block events; callers choose distinct block indices.
    pub fn then(mut self, events: Vec<StreamEvent>) -> Self {
        self.events.extend(events);
        self
    }
}

/// Start, delta and stop events for one text block
pub fn text_block_events(index: u32, fragments: &[&str]) -> Vec<StreamEvent> {
    let mut events = vec![StreamEvent::BlockStart {
        index,
        kind: BlockKind::Text,
    }];
    events.extend(fragments.iter().map(|fragment| StreamEvent::BlockDelta {
        index,
        delta: BlockDelta::Text(fragment.to_string()),
    }));
    events.push(StreamEvent::BlockStop {
        index,
        block: Some(ContentBlock::text(fragments.concat())),
    });
    events
}

/// Start, argument fragment and stop events for one tool-use block
pub fn tool_use_events(
    index: u32,
    id: &str,
    name: &str,
    input: serde_json::Value,
) -> Vec<StreamEvent> {
    vec![
        StreamEvent::BlockStart {
            index,
            kind: BlockKind::ToolUse,
        },
        StreamEvent::BlockDelta {
            index,
            delta: BlockDelta::InputJson(input.to_string()),
        },
        StreamEvent::BlockStop {
            index,
            block: Some(ContentBlock::ToolUse {
                id: id.to_string(),
                name: name.to_string(),
                input,
            }),
        },
    ]
}

/// Provider that replays scripted rounds in order
#[derive(Clone, Default)]
pub struct MockProvider {
    rounds: Arc<Mutex<VecDeque<ScriptedRound>>>,
    requests: Arc<Mutex<Vec<MessageRequest>>>,
}

impl MockProvider {
    pub fn new(rounds: Vec<ScriptedRound>) -> Self {
        Self {
            rounds: Arc::new(Mutex::new(rounds.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far, one per round
    pub async fn requests(&self) -> Vec<MessageRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn remaining_rounds(&self) -> usize {
        self.rounds.lock().await.len()
    }
}

#[async_trait]
impl ReasoningProvider for MockProvider {
    async fn stream_message(&self, request: MessageRequest) -> Result<MessageStream, ProviderError> {
        self.requests.lock().await.push(request);

        let round = self
            .rounds
            .lock()
            .await
            .pop_front()
            .ok_or(ProviderError::Exhausted)?;

        let mut items: Vec<Result<StreamEvent, ProviderError>> =
            round.events.into_iter().map(Ok).collect();
        if let Some(message) = round.stream_error {
            items.push(Err(ProviderError::Transport(message)));
        }
        let events = Box::pin(tokio_stream::iter(items));

        Ok(match round.final_message {
            Some(final_message) => MessageStream::with_final_message(events, final_message),
            None => MessageStream::new(events),
        })
    }
}
