#![allow(dead_code)]

use api::{build_app, AppState};
use inference_providers::{MockProvider, ScriptedRound};
use serde_json::{json, Value};
use services::{
    tools::MockToolExecutor, AgentSettings, ConfiguredAgentFactory, EmptyToolExecutor,
    ToolExecutor, ToolSpec,
};
use std::sync::Arc;

pub const TEST_MODEL: &str = "claude-sonnet-4-5";

fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::level_filters::LevelFilter::DEBUG)
        .try_init();
}

/// Server whose agent replays `rounds` and uses `tools`
pub fn setup_test_server_with(
    rounds: Vec<ScriptedRound>,
    tools: impl ToolExecutor + 'static,
) -> (axum_test::TestServer, MockProvider) {
    init_test_tracing();

    let provider = MockProvider::new(rounds);
    let factory = ConfiguredAgentFactory::from_parts(
        Some(Arc::new(provider.clone())),
        Arc::new(tools),
        AgentSettings::new(TEST_MODEL),
        false,
    );
    let app = build_app(AppState::new(Arc::new(factory)));

    (axum_test::TestServer::new(app).unwrap(), provider)
}

pub fn setup_test_server(rounds: Vec<ScriptedRound>) -> (axum_test::TestServer, MockProvider) {
    setup_test_server_with(rounds, EmptyToolExecutor)
}

/// Server without provider credentials
pub fn setup_unconfigured_server() -> axum_test::TestServer {
    init_test_tracing();

    let factory = ConfiguredAgentFactory::from_parts(
        None,
        Arc::new(EmptyToolExecutor),
        AgentSettings::new(TEST_MODEL),
        false,
    );
    axum_test::TestServer::new(build_app(AppState::new(Arc::new(factory)))).unwrap()
}

/// Tool executor advertising `echo`, which returns `output`
pub fn echo_tools(output: &'static str) -> MockToolExecutor {
    let mut tools = MockToolExecutor::new();
    tools.expect_list_tools().returning(|| {
        Ok(vec![ToolSpec {
            name: "echo".to_string(),
            description: Some("Echo the arguments".to_string()),
            input_schema: Some(json!({
                "type": "object",
                "properties": {"x": {"type": "integer"}}
            })),
        }])
    });
    tools
        .expect_call_tool()
        .returning(move |_, _| Ok(output.to_string()));
    tools
}

pub fn chat_body(question: &str, stream: bool) -> Value {
    json!({
        "messages": [{"role": "user", "content": question}],
        "stream": stream
    })
}

/// Payloads of every `data:` line of an SSE body, `[DONE]` included
pub fn sse_data(body: &str) -> Vec<String> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")))
        .map(|data| data.trim().to_string())
        .collect()
}

/// JSON chunks of an SSE body, excluding `[DONE]`
pub fn sse_chunks(body: &str) -> Vec<Value> {
    sse_data(body)
        .iter()
        .filter(|data| data.as_str() != "[DONE]")
        .map(|data| serde_json::from_str(data).unwrap())
        .collect()
}

/// Concatenated `content` of all chunk deltas
pub fn streamed_content(chunks: &[Value]) -> String {
    chunks
        .iter()
        .filter_map(|chunk| chunk["choices"][0]["delta"]["content"].as_str())
        .collect()
}
