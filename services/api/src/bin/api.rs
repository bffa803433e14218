//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{InMemoryCourseStore, OpenAiCompletionAdapter},
    config::Config,
    error::ApiError,
    web::{api_router, AppState, ApiDoc},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::Router;
use course_forge_core::DocumentPipeline;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let mut openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Internal("OPENAI_API_KEY is required".to_string()))?,
    );
    if let Some(base_url) = config.openai_base_url.as_ref() {
        openai_config = openai_config.with_api_base(base_url);
    }
    let openai_client = Client::with_config(openai_config);

    let completion_adapter = Arc::new(OpenAiCompletionAdapter::new(openai_client));
    let course_store = Arc::new(InMemoryCourseStore::new());

    // --- 3. Build the Pipeline & Shared AppState ---
    info!(
        primary_model = %config.pipeline.primary_model,
        fallback_model = ?config.pipeline.fallback_model,
        max_context_tokens = config.pipeline.max_context_tokens,
        "Building generation pipeline"
    );
    let pipeline = DocumentPipeline::new(completion_adapter, config.pipeline.clone())
        .with_repository(course_store.clone());

    let app_state = Arc::new(AppState {
        pipeline: Arc::new(pipeline),
        courses: course_store,
        config: config.clone(),
    });

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
