use super::ports::{AgentError, ChatAgent, DeltaStream, NormalizedDelta};
use async_trait::async_trait;
use inference_providers::Message;

pub const SIMULATED_RESPONSE: &str = "Simulated response.";

/// Agent that answers without contacting the provider or any tool server
#[derive(Debug, Clone)]
pub struct SimulatedAgent {
    model: String,
}

impl SimulatedAgent {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatAgent for SimulatedAgent {
    fn model(&self) -> &str {
        &self.model
    }

    async fn ask(&self, _messages: Vec<Message>) -> Result<String, AgentError> {
        Ok(SIMULATED_RESPONSE.to_string())
    }

    fn ask_stream(&self, _messages: Vec<Message>) -> DeltaStream {
        Box::pin(futures::stream::iter(vec![
            Ok(NormalizedDelta::Content(SIMULATED_RESPONSE.to_string())),
            Ok(NormalizedDelta::Finish),
        ]))
    }
}
