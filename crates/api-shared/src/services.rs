//! Construction of the production pipeline.

use agent_core::{AgentConfig, AgentPipeline, AgentResult, OpenAiClient};
use fhir::FhirClient;
use std::sync::Arc;

/// Pipeline backed by a FHIR server and an OpenAI-compatible model.
pub type LivePipeline = AgentPipeline<FhirClient, OpenAiClient>;

/// Build the production pipeline from resolved configuration.
///
/// A missing model credential is not an error here; each run reports it instead.
///
/// # Errors
///
/// Returns [`agent_core::AgentError::Configuration`] if either HTTP client cannot be built.
pub fn live_pipeline(config: Arc<AgentConfig>) -> AgentResult<LivePipeline> {
    let records = FhirClient::new(config.fhir_base_url(), config.fhir_timeout())?;
    let model = OpenAiClient::new(&config)?;

    if !config.has_credential() {
        tracing::warn!("model credential is not configured; runs will fail until it is set");
    }
    tracing::info!(
        fhir_base_url = config.fhir_base_url(),
        model = config.model_name(),
        handoff = config.handoff(),
        "pipeline configured"
    );

    Ok(AgentPipeline::new(Arc::new(records), Arc::new(model), config))
}
