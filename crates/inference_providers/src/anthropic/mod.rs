//! Anthropic backend implementation
//!
//! This backend handles HTTP communication with Anthropic's Messages API.
//! Format conversion and event parsing live in the `converter` module.

mod converter;

pub use converter::{build_request, convert_messages, AnthropicEventParser, AnthropicRequest};

use crate::{
    sse_parser::BufferedSseParser, MessageRequest, MessageStream, ProviderError,
    ReasoningProvider,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use reqwest::{header::HeaderValue, Client};
use std::time::Duration;

pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub version: String,
    pub timeout_seconds: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            version: DEFAULT_ANTHROPIC_VERSION.to_string(),
            timeout_seconds: 120,
        }
    }
}

/// SSE parser type alias for Anthropic
pub type AnthropicSseParser<S> = BufferedSseParser<S, AnthropicEventParser>;

/// Create a new Anthropic SSE parser
pub fn new_anthropic_sse_parser<S>(stream: S) -> AnthropicSseParser<S>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Unpin,
{
    BufferedSseParser::new(stream, AnthropicEventParser::new())
}

/// Streams model rounds from Anthropic's Messages API
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Fails when the API key is empty or the HTTP client cannot be built.
    pub fn new(config: AnthropicConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "ANTHROPIC_API_KEY is required.".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn build_headers(&self) -> Result<reqwest::header::HeaderMap, ProviderError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let api_key = HeaderValue::from_str(&self.config.api_key)
            .map_err(|e| ProviderError::Configuration(format!("Invalid API key format: {e}")))?;
        headers.insert("x-api-key", api_key);

        let version = HeaderValue::from_str(&self.config.version).map_err(|e| {
            ProviderError::Configuration(format!("Invalid anthropic-version header: {e}"))
        })?;
        headers.insert("anthropic-version", version);

        Ok(headers)
    }
}

#[async_trait]
impl ReasoningProvider for AnthropicProvider {
    async fn stream_message(&self, request: MessageRequest) -> Result<MessageStream, ProviderError> {
        let url = format!("{}/messages", self.config.base_url.trim_end_matches('/'));
        let body = build_request(&request);
        let headers = self.build_headers()?;

        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            thinking = body.thinking.is_some(),
            "Sending Anthropic streaming request"
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status_code = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response body: {e}"));
            return Err(ProviderError::HttpError {
                status_code,
                message: error_text,
            });
        }

        let events = new_anthropic_sse_parser(Box::pin(response.bytes_stream()));
        Ok(MessageStream::new(Box::pin(events)))
    }
}
