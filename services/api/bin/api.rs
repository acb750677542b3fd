//! Main Entrypoint for the Roadmap API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Building the LLM client, curriculum service and generation pipeline.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use roadmap_api::{config::ServerConfig, router::create_router, state::AppState};
use roadmap_core::{
    RoadmapPipeline,
    curriculum::LLMCurriculumService,
    gate::ConcurrencyGate,
    llm_client::{LLMClient, OpenAICompatibleClient},
    retry::{CompletionClient, RetryPolicy},
    storage::OutputStore,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.core.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Initialize Shared Services ---
    let llm_client: Arc<dyn LLMClient> = Arc::new(OpenAICompatibleClient::new(
        config.core.openai_config(),
        config.core.chat_model.clone(),
    ));
    let policy = RetryPolicy::default();
    let curriculum = Arc::new(LLMCurriculumService::new(CompletionClient::new(
        llm_client.clone(),
        policy,
    ))?);
    let pipeline = RoadmapPipeline::new(
        curriculum,
        llm_client,
        policy,
        ConcurrencyGate::default(),
        OutputStore::new(config.core.output_dir.clone()),
    )?;

    let app_state = Arc::new(AppState { pipeline });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    info!(
        provider = ?config.core.provider,
        model = %config.core.chat_model,
        output_dir = %config.core.output_dir.display(),
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server has shut down.");
    Ok(())
}
