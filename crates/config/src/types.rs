use crate::ConfigError;
use serde::Deserialize;
use std::{collections::HashMap, env, path::Path, str::FromStr};

/// Default location of the system prompt, relative to the working directory.
pub const DEFAULT_SYSTEM_PROMPT_PATH: &str = "prompts/system_prompt.txt";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub provider: ProviderConfig,
    pub mcp: McpConfig,
    pub agent: AgentConfig,
}

impl ApiConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            server: ServerConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            provider: ProviderConfig::from_env()?,
            mcp: McpConfig::from_env()?,
            agent: AgentConfig::from_env()?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_env("SERVER_PORT", 5000)?,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

/// Logging Configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub modules: HashMap<String, String>,
}

impl LoggingConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut modules = HashMap::new();

        // Load module-specific log levels
        if let Ok(level) = env::var("LOG_MODULE_API") {
            modules.insert("api".to_string(), level);
        }
        if let Ok(level) = env::var("LOG_MODULE_SERVICES") {
            modules.insert("services".to_string(), level);
        }
        if let Ok(level) = env::var("LOG_MODULE_INFERENCE_PROVIDERS") {
            modules.insert("inference_providers".to_string(), level);
        }

        Ok(Self {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            modules,
        })
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            modules: HashMap::new(),
        }
    }
}

/// Anthropic Messages API connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub version: String,
    pub timeout_seconds: u64,
}

impl ProviderConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            api_key: env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: env::var("ANTHROPIC_BASE_URL").unwrap_or(defaults.base_url),
            version: env::var("ANTHROPIC_VERSION").unwrap_or(defaults.version),
            timeout_seconds: parse_env("ANTHROPIC_TIMEOUT_SECONDS", defaults.timeout_seconds)?,
        })
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.anthropic.com/v1".to_string(),
            version: "2023-06-01".to_string(),
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Streamable HTTP endpoint of the MCP server. No tools are offered when unset.
    pub server_url: Option<String>,
    pub client_name: String,
    pub connection_timeout_seconds: u64,
    pub tool_timeout_seconds: u64,
}

impl McpConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            server_url: env::var("MCP_SERVER_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            client_name: env::var("CLIENT_NAME").unwrap_or(defaults.client_name),
            connection_timeout_seconds: parse_env(
                "MCP_CONNECTION_TIMEOUT_SECONDS",
                defaults.connection_timeout_seconds,
            )?,
            tool_timeout_seconds: parse_env(
                "MCP_TOOL_TIMEOUT_SECONDS",
                defaults.tool_timeout_seconds,
            )?,
        })
    }
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            client_name: "mcp-agent-base".to_string(),
            connection_timeout_seconds: 30,
            tool_timeout_seconds: 60,
        }
    }
}

/// Settings for the reasoning agent loop
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub include_tool_logs: bool,
    /// Answer with a canned response instead of calling the provider.
    pub simulate: bool,
    pub thinking_enabled: bool,
    pub thinking_budget_tokens: u32,
    /// Upper bound on model rounds per request; `None` disables the guard.
    pub max_rounds: Option<usize>,
    pub round_timeout_seconds: Option<u64>,
    pub system_prompt: String,
}

impl AgentConfig {
    /// Load from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let prompt_path = env::var("SYSTEM_PROMPT_PATH")
            .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT_PATH.to_string());

        Ok(Self {
            model: env::var("DEFAULT_MODEL").unwrap_or(defaults.model),
            temperature: parse_env("DEFAULT_TEMPERATURE", defaults.temperature)?,
            max_output_tokens: parse_env("DEFAULT_MAX_OUTPUT_TOKENS", defaults.max_output_tokens)?,
            include_tool_logs: env_flag("INCLUDE_TOOL_LOGS", defaults.include_tool_logs),
            simulate: env_flag("SIMULATE", defaults.simulate),
            thinking_enabled: env_flag("THINKING_ENABLED", defaults.thinking_enabled),
            thinking_budget_tokens: parse_env(
                "THINKING_BUDGET_TOKENS",
                defaults.thinking_budget_tokens,
            )?,
            max_rounds: match env::var("AGENT_MAX_ROUNDS") {
                Ok(value) if value.trim() == "0" => None,
                Ok(_) => Some(parse_env("AGENT_MAX_ROUNDS", 0usize)?),
                Err(_) => defaults.max_rounds,
            },
            round_timeout_seconds: match env::var("AGENT_ROUND_TIMEOUT_SECONDS") {
                Ok(_) => Some(parse_env("AGENT_ROUND_TIMEOUT_SECONDS", 0u64)?),
                Err(_) => None,
            },
            system_prompt: load_system_prompt(prompt_path)?,
        })
    }

    /// Thinking budget to request, only when extended thinking is switched on.
    pub fn thinking_budget(&self) -> Option<u32> {
        (self.thinking_enabled && self.thinking_budget_tokens > 0)
            .then_some(self.thinking_budget_tokens)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            temperature: 0.0,
            max_output_tokens: 1024,
            include_tool_logs: true,
            simulate: false,
            thinking_enabled: false,
            thinking_budget_tokens: 1024,
            max_rounds: Some(16),
            round_timeout_seconds: None,
            system_prompt: String::new(),
        }
    }
}

/// Read the system prompt file, trimming surrounding whitespace.
///
/// A missing file yields an empty prompt.
pub fn load_system_prompt<P: AsRef<Path>>(path: P) -> Result<String, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(String::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content.trim().to_string())
}

/// Interpret a boolean environment flag (`1`, `true`, `yes`, `on`).
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key).map(|v| parse_flag(&v)).unwrap_or(default)
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(default),
    }
}
