use super::aggregator::Answer;
use super::demux::{RoundDemultiplexer, RoundOutcome};
use super::ports::{
    AgentError, AgentSettings, ChatAgent, DeltaStream, NormalizedDelta, ToolRequest, ToolResult,
};
use crate::tools::ToolExecutor;
use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedSender};
use inference_providers::{
    ContentBlock, Message, MessageRequest, ReasoningProvider, ThinkingConfig, ToolDefinition,
};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

/// Substituted when a tool returns nothing
pub const EMPTY_TOOL_OUTPUT: &str = "No content returned by tool.";

/// Where deltas go while the loop runs
pub(crate) enum DeltaSink {
    Live(UnboundedSender<Result<NormalizedDelta, AgentError>>),
    Collected,
}

impl DeltaSink {
    fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    fn send(&mut self, delta: NormalizedDelta) -> Result<(), AgentError> {
        match self {
            Self::Live(tx) => tx
                .unbounded_send(Ok(delta))
                .map_err(|_| AgentError::ConsumerDisconnected),
            Self::Collected => Ok(()),
        }
    }

    fn send_all(&mut self, deltas: Vec<NormalizedDelta>) -> Result<(), AgentError> {
        deltas.into_iter().try_for_each(|delta| self.send(delta))
    }
}

/// Tool round-trip coordinator.
///
/// Each call to [`ChatAgent::ask`] or [`ChatAgent::ask_stream`] runs one
/// conversation: model rounds alternate with sequential tool execution until
/// a round requests no tools.
#[derive(Clone)]
pub struct Agent {
    provider: Arc<dyn ReasoningProvider>,
    tools: Arc<dyn ToolExecutor>,
    settings: AgentSettings,
    span: tracing::Span,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn ReasoningProvider>,
        tools: Arc<dyn ToolExecutor>,
        settings: AgentSettings,
    ) -> Self {
        let span = tracing::info_span!("agent", model = %settings.model);
        Self {
            provider,
            tools,
            settings,
            span,
        }
    }

    /// Log all loop activity under `span` instead of the default agent span.
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    fn build_request(&self, conversation: &[Message], tools: &[ToolDefinition]) -> MessageRequest {
        MessageRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_output_tokens,
            temperature: self.settings.temperature,
            messages: conversation.to_vec(),
            tools: tools.to_vec(),
            system: self.settings.system_prompt.clone(),
            thinking: self
                .settings
                .thinking_budget
                .map(|budget_tokens| ThinkingConfig::Enabled { budget_tokens }),
        }
    }

    async fn run(
        &self,
        messages: Vec<Message>,
        sink: &mut DeltaSink,
    ) -> Result<Answer, AgentError> {
        let tools: Vec<ToolDefinition> = self
            .tools
            .list_tools()
            .await?
            .into_iter()
            .map(|tool| tool.into_definition())
            .collect();

        info!(
            tools = tools.len(),
            messages = messages.len(),
            live = sink.is_live(),
            "Starting agent request"
        );

        let mut conversation = messages;
        let mut answer = Answer::default();
        let mut round = 0usize;

        loop {
            round += 1;
            if let Some(max_rounds) = self.settings.max_rounds {
                if round > max_rounds {
                    warn!(max_rounds, "Max rounds reached in agent loop");
                    break;
                }
            }

            debug!(round, "Agent loop round");

            let request = self.build_request(&conversation, &tools);
            let outcome = self.run_round(request, sink).await?;
            sink.send_all(outcome.supplements)?;

            outcome
                .thinking_parts
                .into_iter()
                .for_each(|part| answer.push_thinking(part));
            outcome
                .answer_parts
                .into_iter()
                .for_each(|part| answer.push_answer(part));
            conversation.push(Message::assistant_blocks(outcome.assistant_content));

            if outcome.tool_requests.is_empty() {
                debug!(round, "No tool requests; finishing");
                break;
            }

            let results = self
                .execute_tools(&outcome.tool_requests, sink, &mut answer)
                .await?;
            conversation.push(Message::tool_results(
                results
                    .into_iter()
                    .map(|result| ContentBlock::ToolResult {
                        tool_use_id: result.tool_use_id,
                        content: result.content,
                    })
                    .collect(),
            ));
        }

        sink.send(NormalizedDelta::Finish)?;
        info!(round, "Agent request finished");
        Ok(answer)
    }

    /// Stream one model round. The session is dropped before returning on
    /// every path, releasing the provider connection.
    async fn run_round(
        &self,
        request: MessageRequest,
        sink: &mut DeltaSink,
    ) -> Result<RoundOutcome, AgentError> {
        let live = sink.is_live();
        let round = async {
            let mut stream = self.provider.stream_message(request).await?;
            let mut demux = RoundDemultiplexer::new(live);

            while let Some(event) = stream.next_event().await {
                sink.send_all(demux.on_event(event?))?;
            }

            let final_message = stream.final_message().await?;
            Ok::<_, AgentError>(demux.finish(final_message))
        };

        match self.settings.round_timeout {
            Some(limit) => tokio::time::timeout(limit, round)
                .await
                .map_err(|_| AgentError::RoundTimeout(limit))?,
            None => round.await,
        }
    }

    /// Run tool requests one after another, in the order they were finalized.
    async fn execute_tools(
        &self,
        requests: &[ToolRequest],
        sink: &mut DeltaSink,
        answer: &mut Answer,
    ) -> Result<Vec<ToolResult>, AgentError> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            info!(tool = %request.name, arguments = %request.arguments, "Calling tool");

            if self.settings.include_tool_logs {
                sink.send(NormalizedDelta::Content(calling_log(
                    &request.name,
                    &request.arguments.to_string(),
                )))?;
                let pretty = serde_json::to_string_pretty(&request.arguments)
                    .unwrap_or_else(|_| request.arguments.to_string());
                answer.push_answer(calling_log(&request.name, &pretty));
            }

            let output = self
                .tools
                .call_tool(&request.name, request.arguments.clone())
                .await?;
            let rendered = render_tool_output(&output);
            info!(tool = %request.name, result = %rendered, "Tool result");

            if self.settings.include_tool_logs {
                if !output.is_empty() {
                    sink.send(NormalizedDelta::ToolResult {
                        tool_call_id: request.id.clone(),
                        content: result_log(&request.name, &rendered),
                    })?;
                }
                answer.push_answer(result_log(&request.name, &output));
            }

            results.push(ToolResult {
                tool_use_id: request.id.clone(),
                content: if output.is_empty() {
                    EMPTY_TOOL_OUTPUT.to_string()
                } else {
                    output
                },
            });
        }

        Ok(results)
    }
}

fn calling_log(name: &str, arguments: &str) -> String {
    format!("\n\nCalling `{name}` with args:\n```json\n{arguments}\n```")
}

fn result_log(name: &str, output: &str) -> String {
    format!("\n\nResult from `{name}`:\n```json\n{output}\n```\n")
}

/// Compact JSON when the output parses as a JSON value other than a string,
/// otherwise the raw output.
pub fn render_tool_output(output: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(output) {
        Ok(serde_json::Value::String(_)) | Err(_) => output.to_string(),
        Ok(value) => value.to_string(),
    }
}

#[async_trait]
impl ChatAgent for Agent {
    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn ask(&self, messages: Vec<Message>) -> Result<String, AgentError> {
        let mut sink = DeltaSink::Collected;
        let answer = self
            .run(messages, &mut sink)
            .instrument(self.span.clone())
            .await?;
        Ok(answer.compose())
    }

    fn ask_stream(&self, messages: Vec<Message>) -> DeltaStream {
        let (tx, rx) = mpsc::unbounded();
        let agent = self.clone();
        let span = self.span.clone();

        tokio::spawn(
            async move {
                let mut sink = DeltaSink::Live(tx.clone());
                match agent.run(messages, &mut sink).await {
                    Ok(_) => {}
                    Err(AgentError::ConsumerDisconnected) => {
                        debug!("Consumer went away; abandoning request");
                    }
                    Err(e) => {
                        warn!(error = %e, "Agent request failed");
                        let _ = tx.unbounded_send(Err(e));
                    }
                }
            }
            .instrument(span),
        );

        Box::pin(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{EmptyToolExecutor, MockToolExecutor, ToolError, ToolSpec};
    use futures::StreamExt;
    use inference_providers::mock::{text_block_events, tool_use_events};
    use inference_providers::{
        FinalMessage, MessageContent, MessageStream, MockProvider, ProviderError, ScriptedRound,
    };
    use mockall::Sequence;
    use serde_json::json;
    use std::time::Duration;

    fn agent(provider: &MockProvider, tools: impl ToolExecutor + 'static) -> Agent {
        Agent::new(
            Arc::new(provider.clone()),
            Arc::new(tools),
            AgentSettings::new("claude-sonnet-4-5"),
        )
    }

    fn echo_tools(output: &'static str) -> MockToolExecutor {
        let mut tools = MockToolExecutor::new();
        tools.expect_list_tools().returning(|| {
            Ok(vec![ToolSpec {
                name: "echo".to_string(),
                description: Some("Echo the arguments".to_string()),
                input_schema: None,
            }])
        });
        tools
            .expect_call_tool()
            .withf(|name, arguments| name == "echo" && arguments == &json!({"x": 1}))
            .returning(move |_, _| Ok(output.to_string()));
        tools
    }

    async fn collect(stream: DeltaStream) -> Vec<Result<NormalizedDelta, AgentError>> {
        stream.collect().await
    }

    fn live_content(deltas: &[Result<NormalizedDelta, AgentError>]) -> String {
        deltas
            .iter()
            .filter_map(|d| match d {
                Ok(NormalizedDelta::Content(text)) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_render_tool_output() {
        assert_eq!(render_tool_output("{\"x\": 1}"), "{\"x\":1}");
        assert_eq!(render_tool_output("[1, 2]"), "[1,2]");
        assert_eq!(render_tool_output("\"quoted\""), "\"quoted\"");
        assert_eq!(render_tool_output("plain text"), "plain text");
    }

    #[test]
    fn test_log_sections() {
        assert_eq!(
            calling_log("echo", "{\"x\":1}"),
            "\n\nCalling `echo` with args:\n```json\n{\"x\":1}\n```"
        );
        assert_eq!(
            result_log("echo", "ok"),
            "\n\nResult from `echo`:\n```json\nok\n```\n"
        );
    }

    #[tokio::test]
    async fn test_plain_question_is_answered_in_one_round() {
        let provider = MockProvider::new(vec![ScriptedRound::text("4")]);
        let agent = agent(&provider, EmptyToolExecutor);

        let answer = agent.ask(vec![Message::user("2+2?")]).await.unwrap();

        assert_eq!(answer, "4");
        let requests = provider.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "claude-sonnet-4-5");
        assert!(requests[0].tools.is_empty());
        assert!(requests[0].thinking.is_none());
    }

    #[tokio::test]
    async fn test_live_stream_ends_with_a_single_finish() {
        let provider = MockProvider::new(vec![ScriptedRound::text_fragments(&["Hel", "lo"])]);
        let agent = agent(&provider, EmptyToolExecutor);

        let deltas = collect(agent.ask_stream(vec![Message::user("hi")])).await;

        assert!(deltas.iter().all(|d| d.is_ok()));
        let finishes = deltas
            .iter()
            .filter(|d| matches!(d, Ok(NormalizedDelta::Finish)))
            .count();
        assert_eq!(finishes, 1);
        assert!(matches!(deltas.last(), Some(Ok(NormalizedDelta::Finish))));
        assert_eq!(live_content(&deltas), "Hello\n");
    }

    #[tokio::test]
    async fn test_collected_answer_matches_live_content() {
        let script = || ScriptedRound::text_fragments(&["The answer", " is ", "four."]);
        let live_provider = MockProvider::new(vec![script()]);
        let collected_provider = MockProvider::new(vec![script()]);

        let deltas = collect(
            agent(&live_provider, EmptyToolExecutor).ask_stream(vec![Message::user("2+2?")]),
        )
        .await;
        let collected = agent(&collected_provider, EmptyToolExecutor)
            .ask(vec![Message::user("2+2?")])
            .await
            .unwrap();

        assert_eq!(live_content(&deltas).trim(), collected);
    }

    #[tokio::test]
    async fn test_tool_round_trip_feeds_result_back() {
        let provider = MockProvider::new(vec![
            ScriptedRound::tool_use("toolu_1", "echo", json!({"x": 1})),
            ScriptedRound::text("Echoed."),
        ]);
        let agent = agent(&provider, echo_tools("{\"x\": 1}"));

        let deltas = collect(agent.ask_stream(vec![Message::user("echo x=1")])).await;

        let descriptors: Vec<_> = deltas
            .iter()
            .filter_map(|d| match d {
                Ok(NormalizedDelta::ToolCalls(calls)) => Some(calls.clone()),
                _ => None,
            })
            .flatten()
            .collect();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].id, "toolu_1");
        assert_eq!(descriptors[0].name, "echo");

        let result = deltas.iter().find_map(|d| match d {
            Ok(NormalizedDelta::ToolResult {
                tool_call_id,
                content,
            }) => Some((tool_call_id.clone(), content.clone())),
            _ => None,
        });
        assert_eq!(
            result,
            Some((
                "toolu_1".to_string(),
                "\n\nResult from `echo`:\n```json\n{\"x\":1}\n```\n".to_string()
            ))
        );
        assert!(matches!(deltas.last(), Some(Ok(NormalizedDelta::Finish))));

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].tools[0].input_schema, json!({"type": "object"}));

        let second = &requests[1].messages;
        assert_eq!(second.len(), 3);
        assert!(matches!(
            &second[1].content,
            MessageContent::Blocks(blocks)
                if matches!(&blocks[0], ContentBlock::ToolUse { id, .. } if id == "toolu_1")
        ));
        assert_eq!(
            second[2],
            Message::tool_results(vec![ContentBlock::ToolResult {
                tool_use_id: "toolu_1".to_string(),
                content: "{\"x\": 1}".to_string(),
            }])
        );
    }

    #[tokio::test]
    async fn test_tools_run_in_request_order_with_one_result_turn() {
        let provider = MockProvider::new(vec![
            ScriptedRound::tool_use("toolu_a", "first", json!({"n": 1}))
                .then(tool_use_events(1, "toolu_b", "second", json!({"n": 2}))),
            ScriptedRound::text("Both done."),
        ]);

        let mut tools = MockToolExecutor::new();
        tools.expect_list_tools().returning(|| Ok(Vec::new()));
        let mut order = Sequence::new();
        tools
            .expect_call_tool()
            .withf(|name, _| name == "first")
            .times(1)
            .in_sequence(&mut order)
            .returning(|_, _| Ok("r1".to_string()));
        tools
            .expect_call_tool()
            .withf(|name, _| name == "second")
            .times(1)
            .in_sequence(&mut order)
            .returning(|_, _| Ok("r2".to_string()));

        let agent = agent(&provider, tools);
        let deltas = collect(agent.ask_stream(vec![Message::user("run both")])).await;

        let result_ids: Vec<_> = deltas
            .iter()
            .filter_map(|d| match d {
                Ok(NormalizedDelta::ToolResult { tool_call_id, .. }) => Some(tool_call_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(result_ids, vec!["toolu_a", "toolu_b"]);
        assert!(matches!(deltas.last(), Some(Ok(NormalizedDelta::Finish))));

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 2);
        let second = &requests[1].messages;
        assert_eq!(second.len(), 3);
        assert_eq!(
            second[2],
            Message::tool_results(vec![
                ContentBlock::ToolResult {
                    tool_use_id: "toolu_a".to_string(),
                    content: "r1".to_string(),
                },
                ContentBlock::ToolResult {
                    tool_use_id: "toolu_b".to_string(),
                    content: "r2".to_string(),
                },
            ])
        );
    }

    #[tokio::test]
    async fn test_text_block_at_nonzero_index_is_not_duplicated() {
        let provider = MockProvider::new(vec![ScriptedRound::new(text_block_events(1, &["Hello"]))]);
        let agent = agent(&provider, EmptyToolExecutor);

        let answer = agent.ask(vec![Message::user("hi")]).await.unwrap();

        assert_eq!(answer, "Hello");
    }

    #[tokio::test]
    async fn test_collected_answer_includes_tool_logs() {
        let provider = MockProvider::new(vec![
            ScriptedRound::tool_use("toolu_1", "echo", json!({"x": 1})),
            ScriptedRound::text("Echoed."),
        ]);
        let agent = agent(&provider, echo_tools("{\"x\": 1}"));

        let answer = agent.ask(vec![Message::user("echo x=1")]).await.unwrap();

        assert_eq!(
            answer,
            "Calling `echo` with args:\n```json\n{\n  \"x\": 1\n}\n```\n\n\
             Result from `echo`:\n```json\n{\"x\": 1}\n```\nEchoed."
        );
    }

    #[tokio::test]
    async fn test_tool_logs_can_be_disabled() {
        let provider = MockProvider::new(vec![
            ScriptedRound::tool_use("toolu_1", "echo", json!({"x": 1})),
            ScriptedRound::text("Echoed."),
        ]);
        let mut settings = AgentSettings::new("claude-sonnet-4-5");
        settings.include_tool_logs = false;
        let agent = Agent::new(
            Arc::new(provider.clone()),
            Arc::new(echo_tools("ok")),
            settings,
        );

        let deltas = collect(agent.ask_stream(vec![Message::user("echo")])).await;

        assert!(!deltas
            .iter()
            .any(|d| matches!(d, Ok(NormalizedDelta::ToolResult { .. }))));
        assert!(!live_content(&deltas).contains("Calling `echo`"));
    }

    #[tokio::test]
    async fn test_empty_tool_output_is_replaced_for_the_model() {
        let provider = MockProvider::new(vec![
            ScriptedRound::tool_use("toolu_1", "echo", json!({"x": 1})),
            ScriptedRound::text("Nothing came back."),
        ]);
        let agent = agent(&provider, echo_tools(""));

        let deltas = collect(agent.ask_stream(vec![Message::user("echo")])).await;

        assert!(!deltas
            .iter()
            .any(|d| matches!(d, Ok(NormalizedDelta::ToolResult { .. }))));
        let requests = provider.requests().await;
        assert_eq!(
            requests[1].messages[2],
            Message::tool_results(vec![ContentBlock::ToolResult {
                tool_use_id: "toolu_1".to_string(),
                content: EMPTY_TOOL_OUTPUT.to_string(),
            }])
        );
    }

    #[tokio::test]
    async fn test_thinking_precedes_answer_label() {
        let provider = MockProvider::new(vec![ScriptedRound::thinking_then_text(
            "Two plus two.",
            "4",
        )]);
        let mut settings = AgentSettings::new("claude-sonnet-4-5");
        settings.thinking_budget = Some(1024);
        let agent = Agent::new(Arc::new(provider.clone()), Arc::new(EmptyToolExecutor), settings);

        let answer = agent.ask(vec![Message::user("2+2?")]).await.unwrap();

        assert_eq!(
            answer,
            "**Thoughts:**\n\nTwo plus two.\n\n---\n\n**Answer:**\n\n4"
        );
        let requests = provider.requests().await;
        assert_eq!(
            requests[0].thinking,
            Some(ThinkingConfig::Enabled {
                budget_tokens: 1024
            })
        );
    }

    #[tokio::test]
    async fn test_live_thinking_is_announced_and_separated() {
        let provider = MockProvider::new(vec![ScriptedRound::thinking_then_text("Hmm.", "4")]);
        let agent = agent(&provider, EmptyToolExecutor);

        let deltas = collect(agent.ask_stream(vec![Message::user("2+2?")])).await;
        let deltas: Vec<_> = deltas.into_iter().map(Result::unwrap).collect();

        assert_eq!(deltas[0], NormalizedDelta::ThinkingStarted);
        assert_eq!(deltas[1], NormalizedDelta::Thinking("Hmm.".to_string()));
        assert_eq!(
            deltas[2],
            NormalizedDelta::Content(crate::agent::aggregator::SECTION_SEPARATOR.to_string())
        );
    }

    #[tokio::test]
    async fn test_unstreamed_final_text_is_supplemented() {
        let provider = MockProvider::new(vec![ScriptedRound::text_fragments(&["Hel"])
            .with_final_message(FinalMessage::new(vec![ContentBlock::text("Hello")]))]);
        let agent = agent(&provider, EmptyToolExecutor);

        let deltas = collect(agent.ask_stream(vec![Message::user("hi")])).await;

        assert!(live_content(&deltas).contains("lo"));
        assert!(matches!(deltas.last(), Some(Ok(NormalizedDelta::Finish))));
    }

    #[tokio::test]
    async fn test_tool_failure_aborts_request() {
        let provider = MockProvider::new(vec![
            ScriptedRound::tool_use("toolu_1", "echo", json!({"x": 1})),
            ScriptedRound::text("never reached"),
        ]);
        let mut tools = MockToolExecutor::new();
        tools.expect_list_tools().returning(|| Ok(vec![]));
        tools
            .expect_call_tool()
            .returning(|_, _| Err(ToolError::Transport("connection reset".to_string())));
        let agent = agent(&provider, tools);

        let result = agent.ask(vec![Message::user("echo")]).await;

        assert!(matches!(result, Err(AgentError::Tool(ToolError::Transport(_)))));
        assert_eq!(provider.remaining_rounds().await, 1);
    }

    #[tokio::test]
    async fn test_live_failure_is_the_last_item_and_no_finish_is_sent() {
        let provider = MockProvider::new(vec![ScriptedRound::failing(
            inference_providers::mock::text_block_events(0, &["par"]),
            "socket closed",
        )]);
        let agent = agent(&provider, EmptyToolExecutor);

        let deltas = collect(agent.ask_stream(vec![Message::user("hi")])).await;

        assert!(matches!(
            deltas.last(),
            Some(Err(AgentError::Provider(ProviderError::Transport(_))))
        ));
        assert!(!deltas
            .iter()
            .any(|d| matches!(d, Ok(NormalizedDelta::Finish))));
    }

    #[tokio::test]
    async fn test_tool_listing_failure_aborts_before_any_round() {
        let provider = MockProvider::new(vec![ScriptedRound::text("unused")]);
        let mut tools = MockToolExecutor::new();
        tools
            .expect_list_tools()
            .returning(|| Err(ToolError::Unavailable("down".to_string())));
        let agent = agent(&provider, tools);

        let result = agent.ask(vec![Message::user("hi")]).await;

        assert!(matches!(result, Err(AgentError::Tool(_))));
        assert!(provider.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_round_limit_stops_the_loop() {
        let provider = MockProvider::new(vec![
            ScriptedRound::tool_use("toolu_1", "echo", json!({"x": 1})),
            ScriptedRound::text("never reached"),
        ]);
        let mut settings = AgentSettings::new("claude-sonnet-4-5");
        settings.max_rounds = Some(1);
        let agent = Agent::new(
            Arc::new(provider.clone()),
            Arc::new(echo_tools("ok")),
            settings,
        );

        let deltas = collect(agent.ask_stream(vec![Message::user("echo")])).await;

        assert!(matches!(deltas.last(), Some(Ok(NormalizedDelta::Finish))));
        assert_eq!(provider.requests().await.len(), 1);
        assert_eq!(provider.remaining_rounds().await, 1);
    }

    struct StalledProvider;

    #[async_trait]
    impl ReasoningProvider for StalledProvider {
        async fn stream_message(
            &self,
            _request: MessageRequest,
        ) -> Result<MessageStream, ProviderError> {
            futures::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_round_timeout() {
        let mut settings = AgentSettings::new("claude-sonnet-4-5");
        settings.round_timeout = Some(Duration::from_millis(50));
        let agent = Agent::new(Arc::new(StalledProvider), Arc::new(EmptyToolExecutor), settings);

        let result = agent.ask(vec![Message::user("hi")]).await;

        assert!(matches!(result, Err(AgentError::RoundTimeout(_))));
    }
}
