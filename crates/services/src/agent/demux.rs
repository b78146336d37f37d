//! Event demultiplexer for a single model round
//!
//! Classifies provider stream events into live deltas, remembers what was
//! streamed per block, captures finalized tool requests and reconciles the
//! streamed fragments against the provider's final message.

use super::aggregator::SECTION_SEPARATOR;
use super::ports::{NormalizedDelta, ToolRequest};
use inference_providers::{BlockDelta, BlockKind, ContentBlock, FinalMessage, StreamEvent};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Everything a finished round contributes to the request
#[derive(Debug, Clone, PartialEq)]
pub struct RoundOutcome {
    /// Final content blocks, recorded as the assistant turn
    pub assistant_content: Vec<ContentBlock>,
    pub thinking_parts: Vec<String>,
    pub answer_parts: Vec<String>,
    /// Live deltas for text the stream never delivered
    pub supplements: Vec<NormalizedDelta>,
    /// Tool requests in finalize order
    pub tool_requests: Vec<ToolRequest>,
}

#[derive(Debug)]
pub struct RoundDemultiplexer {
    live: bool,
    block_kinds: HashMap<u32, BlockKind>,
    streamed_text: BTreeMap<u32, String>,
    streamed_thinking: BTreeMap<u32, String>,
    tool_requests: Vec<ToolRequest>,
}

impl RoundDemultiplexer {
    /// In collected mode (`live == false`) no deltas are produced.
    pub fn new(live: bool) -> Self {
        Self {
            live,
            block_kinds: HashMap::new(),
            streamed_text: BTreeMap::new(),
            streamed_thinking: BTreeMap::new(),
            tool_requests: Vec::new(),
        }
    }

    pub fn on_event(&mut self, event: StreamEvent) -> Vec<NormalizedDelta> {
        let mut deltas = Vec::new();

        match event {
            StreamEvent::BlockStart { index, kind } => {
                self.block_kinds.insert(index, kind);
                if kind == BlockKind::Thinking {
                    deltas.push(NormalizedDelta::ThinkingStarted);
                }
            }

            StreamEvent::BlockDelta { index, delta } => {
                let declared_thinking = self.block_kinds.get(&index) == Some(&BlockKind::Thinking);
                let (fragment, is_thinking) = match delta {
                    BlockDelta::Text(text) => (text, declared_thinking),
                    BlockDelta::Thinking(text) => (text, true),
                    BlockDelta::InputJson(_) | BlockDelta::Signature(_) => return deltas,
                };

                if fragment.is_empty() {
                    return deltas;
                }

                if is_thinking {
                    self.streamed_thinking
                        .entry(index)
                        .or_default()
                        .push_str(&fragment);
                    deltas.push(NormalizedDelta::Thinking(fragment));
                } else {
                    self.streamed_text.entry(index).or_default().push_str(&fragment);
                    deltas.push(NormalizedDelta::Content(fragment));
                }
            }

            StreamEvent::BlockStop { index, block } => {
                let kind = self
                    .block_kinds
                    .remove(&index)
                    .or_else(|| block.as_ref().and_then(ContentBlock::kind));

                if kind == Some(BlockKind::Thinking) {
                    deltas.push(NormalizedDelta::Content(SECTION_SEPARATOR.to_string()));
                }
                deltas.push(NormalizedDelta::Content("\n".to_string()));

                if let Some(ContentBlock::ToolUse { id, name, input }) = block {
                    let request = ToolRequest {
                        id,
                        name,
                        arguments: input,
                    };
                    deltas.push(NormalizedDelta::ToolCalls(vec![request.descriptor()]));
                    self.tool_requests.push(request);
                }
            }
        }

        if self.live {
            deltas
        } else {
            Vec::new()
        }
    }

    /// Reconcile with the final message and close the round.
    pub fn finish(mut self, final_message: FinalMessage) -> RoundOutcome {
        let mut supplements = Vec::new();
        let indices: Vec<u32> = (0..final_message.content.len())
            .map(|position| final_message.block_index(position))
            .collect();
        let mut assistant_content = final_message.content;

        for (&index, block) in indices.iter().zip(&assistant_content) {
            match block {
                ContentBlock::Text { text } => {
                    if let Some(rest) = supplement(&mut self.streamed_text, index, text) {
                        supplements.push(NormalizedDelta::Content(rest));
                    }
                }
                ContentBlock::Thinking { thinking, .. } => {
                    if let Some(rest) = supplement(&mut self.streamed_thinking, index, thinking) {
                        supplements.push(NormalizedDelta::Thinking(rest));
                    }
                }
                ContentBlock::ToolUse { id, name, input } => {
                    if !self.tool_requests.iter().any(|r| &r.id == id) {
                        let request = ToolRequest {
                            id: id.clone(),
                            name: name.clone(),
                            arguments: input.clone(),
                        };
                        supplements.push(NormalizedDelta::ToolCalls(vec![request.descriptor()]));
                        self.tool_requests.push(request);
                    }
                }
                ContentBlock::RedactedThinking { .. } | ContentBlock::ToolResult { .. } => {}
            }
        }

        // Every tool result sent next round needs a matching tool-use block
        for request in &self.tool_requests {
            let recorded = assistant_content
                .iter()
                .any(|b| matches!(b, ContentBlock::ToolUse { id, .. } if id == &request.id));
            if !recorded {
                assistant_content.push(ContentBlock::ToolUse {
                    id: request.id.clone(),
                    name: request.name.clone(),
                    input: request.arguments.clone(),
                });
            }
        }

        RoundOutcome {
            assistant_content,
            thinking_parts: self
                .streamed_thinking
                .into_values()
                .filter(|t| !t.is_empty())
                .collect(),
            answer_parts: self
                .streamed_text
                .into_values()
                .filter(|t| !t.is_empty())
                .map(|t| format!("{t}\n"))
                .collect(),
            supplements: if self.live { supplements } else { Vec::new() },
            tool_requests: self.tool_requests,
        }
    }
}

/// Append whatever the canonical text has beyond what was streamed.
fn supplement(streamed: &mut BTreeMap<u32, String>, index: u32, canonical: &str) -> Option<String> {
    let entry = streamed.entry(index).or_default();
    match canonical.strip_prefix(entry.as_str()) {
        Some("") => None,
        Some(rest) => {
            let rest = rest.to_string();
            entry.push_str(&rest);
            Some(rest)
        }
        None => {
            warn!(index, "Streamed fragments diverge from the final message; keeping streamed text");
            None
        }
    }
}
