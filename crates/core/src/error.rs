use agent_types::{IdError, PatientId};

/// Failures of one pipeline invocation.
///
/// A peer disconnect is not an error. It surfaces as [`crate::RunOutcome::Cancelled`].
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("patient {0} not found")]
    RecordNotFound(PatientId),
    #[error("record retrieval failed: {0}")]
    Transport(String),
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invocation cancelled")]
    Cancelled,
}

impl AgentError {
    /// Stable machine-readable code for boundary responses.
    pub fn code(&self) -> &'static str {
        match self {
            AgentError::Configuration(_) => "CONFIGURATION_ERROR",
            AgentError::RecordNotFound(_) => "NOT_FOUND",
            AgentError::Transport(_) => "TRANSPORT_FAILURE",
            AgentError::ModelInvocation(_) => "MODEL_FAILURE",
            AgentError::InvalidInput(_) => "BAD_REQUEST",
            AgentError::Cancelled => "CANCELLED",
        }
    }
}

impl From<IdError> for AgentError {
    fn from(err: IdError) -> Self {
        AgentError::InvalidInput(err.to_string())
    }
}

impl From<fhir::FhirError> for AgentError {
    fn from(err: fhir::FhirError) -> Self {
        AgentError::Configuration(err.to_string())
    }
}

pub type AgentResult<T> = std::result::Result<T, AgentError>;
