//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the single-shot assessment API on its own.
//!
//! ## Intended use
//! Useful for development when only the REST server (with OpenAPI/Swagger UI) is needed. The
//! workspace's main `agents-run` binary runs the REST and streaming services concurrently.

use agent_core::AgentConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the REST API server
///
/// # Environment Variables
/// - `AGENTS_REST_ADDR`: Server address (default: "0.0.0.0:8000")
/// - `OPENAI_API_KEY`, `MODEL_NAME`, `OPENAI_BASE_URL`, `FHIR_BASE_URL`,
///   `FHIR_TIMEOUT_SECS`, `AGENTS_HANDOFF`: see [`AgentConfig::from_env`]
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - configuration values cannot be parsed,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("agent_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("AGENTS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());

    let config = Arc::new(AgentConfig::from_env()?);
    let pipeline = api_shared::live_pipeline(config)?;

    tracing::info!("-- Starting Agents REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, api_rest::router(pipeline)).await?;

    Ok(())
}
