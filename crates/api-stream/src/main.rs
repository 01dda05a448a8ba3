//! Standalone streaming server binary.
//!
//! ## Purpose
//! Runs the WebSocket conversation API on its own. The workspace's main `agents-run` binary
//! runs this together with the REST API.

use agent_core::AgentConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the streaming server
///
/// # Environment Variables
/// - `AGENTS_STREAM_ADDR`: Server address (default: "0.0.0.0:8001")
/// - Agent settings: see [`AgentConfig::from_env`]
///
/// # Errors
/// Returns an error if configuration cannot be parsed, the address cannot be bound, or the
/// server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_stream=info".parse()?)
                .add_directive("agent_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("AGENTS_STREAM_ADDR").unwrap_or_else(|_| "0.0.0.0:8001".into());

    let config = Arc::new(AgentConfig::from_env()?);
    let pipeline = api_shared::live_pipeline(config)?;

    tracing::info!("-- Starting Agents streaming API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, api_stream::router(pipeline)).await?;

    Ok(())
}
