use agent_core::AgentConfig;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the agent services
///
/// Starts both servers concurrently over one shared pipeline:
/// - single-shot REST API on port 8000 (configurable via AGENTS_REST_ADDR)
/// - streaming WebSocket API on port 8001 (configurable via AGENTS_STREAM_ADDR)
///
/// # Environment Variables
/// - `AGENTS_REST_ADDR`: REST server address (default: "0.0.0.0:8000")
/// - `AGENTS_STREAM_ADDR`: streaming server address (default: "0.0.0.0:8001")
/// - `OPENAI_API_KEY`: model credential; without it both services start but every run fails
/// - `MODEL_NAME`, `OPENAI_BASE_URL`, `FHIR_BASE_URL`, `FHIR_TIMEOUT_SECS`, `AGENTS_HANDOFF`
///
/// # Returns
/// * `Ok(())` - If servers start and run successfully
/// * `Err(anyhow::Error)` - If configuration, startup or either server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agents_run=info".parse()?)
                .add_directive("agent_core=info".parse()?)
                .add_directive("fhir=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("AGENTS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".into());
    let stream_addr =
        std::env::var("AGENTS_STREAM_ADDR").unwrap_or_else(|_| "0.0.0.0:8001".into());

    let config = Arc::new(AgentConfig::from_env()?);
    tracing::debug!(?config, "configuration resolved");
    let pipeline = api_shared::live_pipeline(config)?;

    let rest_listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let stream_listener = tokio::net::TcpListener::bind(&stream_addr).await?;

    tracing::info!("++ Starting Agents REST on {}", rest_addr);
    tracing::info!("++ Starting Agents streaming on {}", stream_addr);

    let rest_server =
        axum::serve(rest_listener, api_rest::router(pipeline.clone())).into_future();
    let stream_server =
        axum::serve(stream_listener, api_stream::router(pipeline)).into_future();

    // Run both
    let (rest_result, stream_result) = tokio::join!(rest_server, stream_server);
    rest_result?;
    stream_result?;

    Ok(())
}
