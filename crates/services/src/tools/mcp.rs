//! MCP (Model Context Protocol) tool executor for a remote MCP server
//!
//! Every operation opens its own streamable-HTTP session, identifies itself
//! with the configured client name, and closes the session afterwards.

use super::{ToolError, ToolExecutor, ToolSpec};
use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParams, CallToolResult, ClientInfo},
    service::{RoleClient, RunningService},
    transport::{
        streamable_http_client::StreamableHttpClientTransportConfig,
        StreamableHttpClientTransport,
    },
    ServiceExt,
};
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Timeout for connecting to an MCP server (seconds)
pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Timeout for executing a tool on an MCP server (seconds)
pub const TOOL_EXECUTION_TIMEOUT_SECS: u64 = 60;

type McpSession = RunningService<RoleClient, ClientInfo>;

#[derive(Debug, Clone)]
pub struct McpToolExecutor {
    server_url: String,
    client_name: String,
    connection_timeout: Duration,
    tool_timeout: Duration,
}

impl McpToolExecutor {
    pub fn new(server_url: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            client_name: client_name.into(),
            connection_timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
            tool_timeout: Duration::from_secs(TOOL_EXECUTION_TIMEOUT_SECS),
        }
    }

    pub fn with_timeouts(mut self, connection_timeout: Duration, tool_timeout: Duration) -> Self {
        self.connection_timeout = connection_timeout;
        self.tool_timeout = tool_timeout;
        self
    }

    async fn connect(&self) -> Result<McpSession, ToolError> {
        debug!(server_url = %self.server_url, client_name = %self.client_name, "Connecting to MCP server");

        let mut client_info = ClientInfo::default();
        client_info.client_info.name = self.client_name.clone();
        client_info.client_info.version = env!("CARGO_PKG_VERSION").to_string();

        let config = StreamableHttpClientTransportConfig::with_uri(self.server_url.as_str());
        let transport = StreamableHttpClientTransport::from_config(config);

        timeout(self.connection_timeout, client_info.serve(transport))
            .await
            .map_err(|_| ToolError::Timeout {
                operation: format!("connect to {}", self.server_url),
                seconds: self.connection_timeout.as_secs(),
            })?
            .map_err(|e| ToolError::Transport(e.to_string()))
    }

    async fn close(session: McpSession) {
        if let Err(e) = session.cancel().await {
            warn!(error = %e, "Failed to close MCP session cleanly");
        }
    }
}

/// Join the textual parts of a tool result with newlines.
///
/// Each content item contributes its `text`, else its `data`, else its JSON form.
pub fn render_call_result(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|content| serde_json::to_value(content).ok())
        .map(|value| {
            value
                .get("text")
                .or_else(|| value.get("data"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl ToolExecutor for McpToolExecutor {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        let session = self.connect().await?;
        let listed = timeout(self.connection_timeout, session.list_all_tools()).await;
        Self::close(session).await;

        let tools = listed
            .map_err(|_| ToolError::Timeout {
                operation: "list tools".to_string(),
                seconds: self.connection_timeout.as_secs(),
            })?
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        debug!(count = tools.len(), "Discovered MCP tools");

        Ok(tools
            .into_iter()
            .map(|t| ToolSpec {
                name: t.name.to_string(),
                description: t.description.map(|s| s.to_string()),
                input_schema: Some(serde_json::Value::Object(t.input_schema.as_ref().clone())),
            })
            .collect())
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, ToolError> {
        let request = call_request(tool_name, &arguments);

        let session = self.connect().await?;
        let called = timeout(self.tool_timeout, session.call_tool(request)).await;
        Self::close(session).await;

        let result = called
            .map_err(|_| ToolError::Timeout {
                operation: format!("call `{tool_name}`"),
                seconds: self.tool_timeout.as_secs(),
            })?
            .map_err(|e| ToolError::Transport(e.to_string()))?;

        // Tool-level failures are reported back to the model as output
        if result.is_error.unwrap_or(false) {
            warn!(tool = %tool_name, "MCP tool reported an error");
        }

        Ok(render_call_result(&result))
    }
}

/// Non-object arguments are sent without an arguments map.
fn call_request(tool_name: &str, arguments: &serde_json::Value) -> CallToolRequestParams {
    CallToolRequestParams {
        meta: None,
        name: tool_name.to_string().into(),
        arguments: arguments.as_object().cloned(),
        task: None,
    }
}
