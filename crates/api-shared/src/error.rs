//! HTTP mapping of agent failures.

use crate::schema::{ErrorBody, ErrorDetail};
use agent_core::AgentError;
use agent_types::IdError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// An [`AgentError`] on its way to an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub AgentError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AgentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AgentError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            AgentError::Transport(_) | AgentError::ModelInvocation(_) => StatusCode::BAD_GATEWAY,
            AgentError::Configuration(_) | AgentError::Cancelled => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.0.code().to_string(),
                message: self.0.to_string(),
            },
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        Self(err)
    }
}

impl From<IdError> for ApiError {
    fn from(err: IdError) -> Self {
        Self(err.into())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
