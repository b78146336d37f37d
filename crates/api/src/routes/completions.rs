use crate::{
    models::{ChatCompletionRequest, ErrorResponse},
    openai_adapter::{chat_completion_response, sse_chat_completions, ResponseEnvelope},
    AppState,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{sse::Sse, IntoResponse, Json as ResponseJson, Response},
};
use futures::stream::StreamExt;
use services::AgentError;
use std::convert::Infallible;
use tracing::{debug, error, info};

pub const MISSING_USER_MESSAGE: &str = "A user message is required to ask a question.";

fn agent_error_response(error: &AgentError) -> Response {
    let (status, body) = ErrorResponse::from_agent_error(error);
    error!(error = %error, status = %status, "Chat completion failed");
    (status, ResponseJson(body)).into_response()
}

/// Create chat completion
///
/// Answers the conversation with the tool-using agent. Streams OpenAI
/// `chat.completion.chunk` events by default; set `stream` to `false` for a
/// single `chat.completion` object.
#[utoipa::path(
    post,
    path = "/chat/completions",
    tag = "Chat",
    request_body = ChatCompletionRequest,
    responses(
        (status = 200, description = "Completion (JSON, or an SSE stream when `stream` is true)", body = crate::openai_adapter::ChatCompletionResponse),
        (status = 400, description = "No user message in the conversation", body = ErrorResponse),
        (status = 500, description = "Agent misconfigured", body = ErrorResponse),
        (status = 502, description = "Provider or tool server failure", body = ErrorResponse),
        (status = 504, description = "Model round timed out", body = ErrorResponse)
    )
)]
pub async fn chat_completions(
    State(app_state): State<AppState>,
    Json(request): Json<ChatCompletionRequest>,
) -> Response {
    info!(
        messages = request.messages.len(),
        stream = request.stream,
        simulate = ?request.simulate,
        "Chat completions request"
    );
    if let Some(model) = &request.model {
        debug!(requested_model = %model, "Ignoring requested model; using configured model");
    }

    if request.latest_user_question().is_none() {
        return (
            StatusCode::BAD_REQUEST,
            ResponseJson(ErrorResponse::invalid_request(MISSING_USER_MESSAGE)),
        )
            .into_response();
    }

    let agent = match app_state.agent_factory.create(request.simulate) {
        Ok(agent) => agent,
        Err(e) => return agent_error_response(&e),
    };

    let envelope = ResponseEnvelope::new(agent.model());
    let conversation = request.conversation();

    if request.stream {
        let frames = sse_chat_completions(agent.ask_stream(conversation), envelope)
            .map(|frame| Ok::<_, Infallible>(frame.into_event()));

        return Sse::new(frames)
            .keep_alive(
                axum::response::sse::KeepAlive::new()
                    .interval(std::time::Duration::from_secs(30))
                    .text("keep-alive-text"),
            )
            .into_response();
    }

    match agent.ask(conversation).await {
        Ok(answer) => {
            debug!(length = answer.len(), "Collected answer");
            ResponseJson(chat_completion_response(
                &envelope,
                answer,
                request.prompt_texts(),
            ))
            .into_response()
        }
        Err(e) => agent_error_response(&e),
    }
}
