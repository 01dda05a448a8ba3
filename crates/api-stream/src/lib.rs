//! # API Stream
//!
//! Streaming conversation API.
//!
//! Handles:
//! - The `/ws/conversation/{patient_id}` WebSocket endpoint
//! - Peer disconnect as cooperative cancellation of the run
//! - Health and identity endpoints
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

pub mod channel;

pub use channel::WebSocketChannel;

use agent_core::{AgentError, AgentPipeline, Delivery, DeliveryChannel, ModelClient, RunOutcome};
use agent_types::PatientId;
use api_shared::{HealthRes, HealthService, ServiceInfoRes};
use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    response::{Json, Response},
    routing::get,
    Router,
};
use fhir::RecordSource;
use tower_http::cors::CorsLayer;

/// Name reported by `/` and `/health`.
pub const SERVICE_NAME: &str = "Agents streaming API";

/// Shared state of the streaming server.
pub struct StreamState<R, M> {
    pipeline: AgentPipeline<R, M>,
}

impl<R, M> Clone for StreamState<R, M> {
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
        }
    }
}

/// Build the streaming router around `pipeline`.
pub fn router<R, M>(pipeline: AgentPipeline<R, M>) -> Router
where
    R: RecordSource + 'static,
    M: ModelClient + 'static,
{
    Router::new()
        .route("/", get(service_info))
        .route("/health", get(health))
        .route("/ws/conversation/:patient_id", get(conversation::<R, M>))
        .layer(CorsLayer::permissive())
        .with_state(StreamState { pipeline })
}

#[axum::debug_handler]
async fn service_info() -> Json<ServiceInfoRes> {
    Json(HealthService::service_info(SERVICE_NAME))
}

#[axum::debug_handler]
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health(SERVICE_NAME))
}

/// Upgrade to a WebSocket and stream one conversation over it.
async fn conversation<R, M>(
    ws: WebSocketUpgrade,
    Path(patient_id): Path<String>,
    State(state): State<StreamState<R, M>>,
) -> Response
where
    R: RecordSource + 'static,
    M: ModelClient + 'static,
{
    ws.on_upgrade(move |socket| async move {
        let mut channel = WebSocketChannel::new(socket);
        stream_conversation(&state.pipeline, &patient_id, &mut channel).await;
    })
}

/// Run one conversation for a raw identifier.
///
/// An invalid identifier is reported on the channel without any outbound call.
pub async fn stream_conversation<R, M, C>(
    pipeline: &AgentPipeline<R, M>,
    raw_patient_id: &str,
    channel: &mut C,
) where
    R: RecordSource,
    M: ModelClient,
    C: DeliveryChannel,
{
    let patient_id = match PatientId::new(raw_patient_id) {
        Ok(id) => id,
        Err(err) => {
            let err = AgentError::from(err);
            tracing::info!(error = %err, "rejected conversation");
            channel.deliver(Delivery::Failure(&err)).await;
            channel.close().await;
            return;
        }
    };

    match pipeline.run(&patient_id, channel).await {
        Ok(RunOutcome::Completed(_)) => {}
        Ok(RunOutcome::Cancelled { stage }) => {
            tracing::info!(%patient_id, ?stage, "conversation ended by peer");
        }
        // Already reported on the channel and logged by the pipeline.
        Err(_) => {}
    }
}
