//! Tool-using reasoning agent
//!
//! [`Agent`] drives model rounds through a [`ReasoningProvider`] and executes
//! requested tools through a [`ToolExecutor`], producing [`NormalizedDelta`]s
//! in live mode or a composed answer in collected mode.
//!
//! [`ReasoningProvider`]: inference_providers::ReasoningProvider
//! [`ToolExecutor`]: crate::tools::ToolExecutor

pub mod aggregator;
pub mod demux;
pub mod factory;
pub mod ports;
pub mod service;
pub mod simulated;

pub use aggregator::Answer;
pub use demux::{RoundDemultiplexer, RoundOutcome};
pub use factory::ConfiguredAgentFactory;
pub use ports::{
    AgentError, AgentFactory, AgentSettings, ChatAgent, DeltaStream, NormalizedDelta,
    ToolCallDescriptor, ToolRequest, ToolResult,
};
pub use service::Agent;
pub use simulated::{SimulatedAgent, SIMULATED_RESPONSE};
