pub mod models;
pub mod openai_adapter;
pub mod openapi;
pub mod routes;

use crate::{
    openapi::ApiDoc,
    routes::{chat_completions, health_check},
};
use axum::{
    routing::{get, post},
    Json, Router,
};
use config::LoggingConfig;
use services::AgentFactory;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub agent_factory: Arc<dyn AgentFactory>,
}

impl AppState {
    pub fn new(agent_factory: Arc<dyn AgentFactory>) -> Self {
        Self { agent_factory }
    }
}

/// Build the application router
pub fn build_app(state: AppState) -> Router {
    let completion_routes = Router::new().route("/chat/completions", post(chat_completions));

    Router::new()
        .merge(completion_routes.clone())
        .nest("/v1", completion_routes)
        .route("/health", get(health_check))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Tracing filter directive: the base level followed by per-module overrides.
pub fn tracing_filter(logging_config: &LoggingConfig) -> String {
    let mut modules: Vec<_> = logging_config.modules.iter().collect();
    modules.sort();

    modules
        .into_iter()
        .fold(logging_config.level.clone(), |mut filter, (module, level)| {
            filter.push_str(&format!(",{module}={level}"));
            filter
        })
}

/// Install the global tracing subscriber in the configured format.
pub fn init_tracing(logging_config: &LoggingConfig) {
    let filter = tracing_filter(logging_config);

    match logging_config.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .compact()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .init();
        }
    }
}
