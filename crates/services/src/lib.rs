//! Agent services: the tool round-trip loop and the tool executors it drives.

pub mod agent;
pub mod tools;

pub use agent::{
    Agent, AgentError, AgentFactory, AgentSettings, ChatAgent, ConfiguredAgentFactory,
    DeltaStream, NormalizedDelta, SimulatedAgent, ToolCallDescriptor,
};
pub use tools::{EmptyToolExecutor, McpToolExecutor, ToolError, ToolExecutor, ToolSpec};
