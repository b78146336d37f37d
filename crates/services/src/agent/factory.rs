use super::ports::{AgentError, AgentFactory, AgentSettings, ChatAgent};
use super::service::Agent;
use super::simulated::SimulatedAgent;
use crate::tools::{EmptyToolExecutor, McpToolExecutor, ToolExecutor};
use config::ApiConfig;
use inference_providers::{AnthropicConfig, AnthropicProvider, ReasoningProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Builds agents from the loaded [`ApiConfig`].
///
/// The provider client is created once; a missing API key only fails
/// requests that actually need the provider.
pub struct ConfiguredAgentFactory {
    provider: Option<Arc<dyn ReasoningProvider>>,
    tools: Arc<dyn ToolExecutor>,
    settings: AgentSettings,
    simulate: bool,
}

impl ConfiguredAgentFactory {
    pub fn new(config: &ApiConfig) -> Result<Self, AgentError> {
        let provider = match config
            .provider
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
        {
            Some(api_key) => {
                let provider = AnthropicProvider::new(AnthropicConfig {
                    api_key: api_key.to_string(),
                    base_url: config.provider.base_url.clone(),
                    version: config.provider.version.clone(),
                    timeout_seconds: config.provider.timeout_seconds,
                })?;
                Some(Arc::new(provider) as Arc<dyn ReasoningProvider>)
            }
            None => {
                warn!("ANTHROPIC_API_KEY is not set; only simulated requests will succeed");
                None
            }
        };

        let tools: Arc<dyn ToolExecutor> = match &config.mcp.server_url {
            Some(url) => {
                info!(server_url = %url, "Using MCP tool server");
                Arc::new(
                    McpToolExecutor::new(url.clone(), config.mcp.client_name.clone())
                        .with_timeouts(
                            Duration::from_secs(config.mcp.connection_timeout_seconds),
                            Duration::from_secs(config.mcp.tool_timeout_seconds),
                        ),
                )
            }
            None => {
                warn!("MCP_SERVER_URL is not set; the agent will run without tools");
                Arc::new(EmptyToolExecutor)
            }
        };

        Ok(Self::from_parts(
            provider,
            tools,
            AgentSettings::from_config(&config.agent),
            config.agent.simulate,
        ))
    }

    pub fn from_parts(
        provider: Option<Arc<dyn ReasoningProvider>>,
        tools: Arc<dyn ToolExecutor>,
        settings: AgentSettings,
        simulate: bool,
    ) -> Self {
        Self {
            provider,
            tools,
            settings,
            simulate,
        }
    }
}

impl AgentFactory for ConfiguredAgentFactory {
    /// `simulate` overrides the configured default when given.
    fn create(&self, simulate: Option<bool>) -> Result<Arc<dyn ChatAgent>, AgentError> {
        if simulate.unwrap_or(self.simulate) {
            return Ok(Arc::new(SimulatedAgent::new(self.settings.model.clone())));
        }

        let provider = self.provider.clone().ok_or_else(|| {
            AgentError::Configuration("ANTHROPIC_API_KEY is required.".to_string())
        })?;

        Ok(Arc::new(Agent::new(
            provider,
            self.tools.clone(),
            self.settings.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_providers::{Message, MockProvider, ScriptedRound};

    #[tokio::test]
    async fn test_simulate_flag_overrides_configuration() {
        let factory = ConfiguredAgentFactory::from_parts(
            None,
            Arc::new(EmptyToolExecutor),
            AgentSettings::new("claude-sonnet-4-5"),
            false,
        );

        let agent = factory.create(Some(true)).unwrap();
        assert_eq!(
            agent.ask(vec![Message::user("hi")]).await.unwrap(),
            "Simulated response."
        );
    }

    #[test]
    fn test_missing_api_key_is_a_configuration_error() {
        let factory = ConfiguredAgentFactory::new(&ApiConfig::default()).unwrap();

        let result = factory.create(Some(false));
        assert!(matches!(result, Err(AgentError::Configuration(msg)) if msg.contains("ANTHROPIC_API_KEY")));
    }

    #[test]
    fn test_configured_simulation_is_the_default() {
        let mut config = ApiConfig::default();
        config.agent.simulate = true;
        let factory = ConfiguredAgentFactory::new(&config).unwrap();

        assert!(factory.create(None).is_ok());
        assert!(factory.create(Some(false)).is_err());
    }

    #[tokio::test]
    async fn test_real_agent_uses_provider() {
        let provider = MockProvider::new(vec![ScriptedRound::text("4")]);
        let factory = ConfiguredAgentFactory::from_parts(
            Some(Arc::new(provider.clone())),
            Arc::new(EmptyToolExecutor),
            AgentSettings::new("anthropic:claude-sonnet-4-5"),
            false,
        );

        let agent = factory.create(None).unwrap();
        assert_eq!(agent.model(), "claude-sonnet-4-5");
        assert_eq!(agent.ask(vec![Message::user("2+2?")]).await.unwrap(), "4");
        assert_eq!(provider.requests().await.len(), 1);
    }
}
