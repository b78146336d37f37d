use anyhow::Context;
use api::{build_app, init_tracing, AppState};
use config::ApiConfig;
use services::ConfiguredAgentFactory;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration first to get logging settings
    let config = ApiConfig::load().context("Failed to load configuration")?;

    init_tracing(&config.logging);

    let factory = ConfiguredAgentFactory::new(&config).context("Failed to create agent factory")?;
    tracing::info!(
        model = %config.agent.model,
        simulate = config.agent.simulate,
        thinking = config.agent.thinking_enabled,
        mcp_server = ?config.mcp.server_url,
        "Agent configured"
    );

    let app = build_app(AppState::new(Arc::new(factory)));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    tracing::info!(address = %bind_address, "Server started successfully");
    tracing::info!("API Endpoints:");
    tracing::info!("  - POST /chat/completions (also /v1/chat/completions)");
    tracing::info!("  - GET /health");
    tracing::info!("  - GET /openapi.json");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
