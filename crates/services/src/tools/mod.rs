//! Tool executor port and implementations
//!
//! The agent only depends on [`ToolExecutor`]; the MCP-backed executor talks
//! to a remote server while [`EmptyToolExecutor`] stands in when no server is
//! configured.

pub mod mcp;

pub use mcp::McpToolExecutor;

use async_trait::async_trait;
use inference_providers::ToolDefinition;

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

/// A tool advertised by the executor
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Option<serde_json::Value>,
}

impl ToolSpec {
    /// Provider-facing definition; a missing schema becomes `{"type": "object"}`.
    pub fn into_definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.name,
            description: self.description.unwrap_or_default(),
            input_schema: self
                .input_schema
                .unwrap_or_else(|| serde_json::json!({"type": "object"})),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool transport error: {0}")]
    Transport(String),
    #[error("Tool operation timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },
    #[error("Tool unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError>;

    /// Runs a tool and returns its raw textual output.
    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<String, ToolError>;
}

/// Executor used when no MCP server is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyToolExecutor;

#[async_trait]
impl ToolExecutor for EmptyToolExecutor {
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, ToolError> {
        Ok(vec![])
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        _arguments: serde_json::Value,
    ) -> Result<String, ToolError> {
        Err(ToolError::Unavailable(format!(
            "MCP server not configured; cannot call tool `{tool_name}`"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_spec_defaults_schema_and_description() {
        let definition = ToolSpec {
            name: "ping".to_string(),
            description: None,
            input_schema: None,
        }
        .into_definition();

        assert_eq!(definition.name, "ping");
        assert_eq!(definition.description, "");
        assert_eq!(definition.input_schema, json!({"type": "object"}));
    }

    #[test]
    fn test_tool_spec_keeps_declared_schema() {
        let schema = json!({"type": "object", "properties": {"x": {"type": "integer"}}});
        let definition = ToolSpec {
            name: "echo".to_string(),
            description: Some("Echo".to_string()),
            input_schema: Some(schema.clone()),
        }
        .into_definition();

        assert_eq!(definition.input_schema, schema);
        assert_eq!(definition.description, "Echo");
    }

    #[tokio::test]
    async fn test_empty_executor_lists_nothing_and_rejects_calls() {
        let executor = EmptyToolExecutor;

        assert!(executor.list_tools().await.unwrap().is_empty());
        let result = executor.call_tool("echo", json!({})).await;
        assert!(matches!(result, Err(ToolError::Unavailable(_))));
    }
}
