use crate::models::{ChatCompletionRequest, ChatMessage, ErrorDetail, ErrorResponse};
use crate::openai_adapter::{
    AssistantMessage, ChatChoice, ChatCompletionResponse, ResponseEnvelope, Usage,
};
use crate::routes::health::HealthResponse;
use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agent API",
        description = "OpenAI-compatible chat completions answered by a reasoning model that can call MCP tools mid-answer.",
        version = "1.0.0",
        license(
            name = "MIT",
        )
    ),
    paths(
        crate::routes::completions::chat_completions,
        crate::routes::health::health_check,
    ),
    components(
        schemas(
            ChatCompletionRequest, ChatMessage, ChatCompletionResponse, ResponseEnvelope,
            ChatChoice, AssistantMessage, Usage, ErrorResponse, ErrorDetail, HealthResponse,
        )
    ),
    tags(
        (name = "Chat", description = "Chat completions"),
        (name = "Health", description = "Service health"),
    )
)]
pub struct ApiDoc;
