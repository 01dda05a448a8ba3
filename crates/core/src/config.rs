//! Agent runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services behind
//! an `Arc`. Request handling never reads process-wide environment variables, which keeps
//! behaviour consistent across concurrent invocations and test harnesses.

use crate::constants::{
    DEFAULT_FHIR_BASE_URL, DEFAULT_FHIR_TIMEOUT_SECS, DEFAULT_LLM_BASE_URL, DEFAULT_MODEL_NAME,
    ENV_API_KEY, ENV_FHIR_BASE_URL, ENV_FHIR_TIMEOUT_SECS, ENV_HANDOFF, ENV_LLM_BASE_URL,
    ENV_MODEL_NAME,
};
use crate::{AgentError, AgentResult};
use std::fmt;
use std::time::Duration;

/// Immutable configuration shared by every invocation.
#[derive(Clone)]
pub struct AgentConfig {
    api_key: Option<String>,
    model_name: String,
    llm_base_url: String,
    fhir_base_url: String,
    fhir_timeout: Duration,
    handoff: bool,
}

impl AgentConfig {
    /// Create a new `AgentConfig`.
    ///
    /// A missing `api_key` is accepted here: services still start and answer health checks,
    /// and each invocation fails with [`AgentError::Configuration`] before any outbound call.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Configuration`] if the model name or either base URL is blank,
    /// or the retrieval timeout is zero.
    pub fn new(
        api_key: Option<String>,
        model_name: String,
        llm_base_url: String,
        fhir_base_url: String,
        fhir_timeout: Duration,
        handoff: bool,
    ) -> AgentResult<Self> {
        if model_name.trim().is_empty() {
            return Err(AgentError::Configuration("model name cannot be empty".into()));
        }
        if llm_base_url.trim().is_empty() || fhir_base_url.trim().is_empty() {
            return Err(AgentError::Configuration("base URLs cannot be empty".into()));
        }
        if fhir_timeout.is_zero() {
            return Err(AgentError::Configuration(
                "record retrieval timeout must be positive".into(),
            ));
        }

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model_name: model_name.trim().to_string(),
            llm_base_url: llm_base_url.trim().trim_end_matches('/').to_string(),
            fhir_base_url: fhir_base_url.trim().trim_end_matches('/').to_string(),
            fhir_timeout,
            handoff,
        })
    }

    /// Resolve configuration from the process environment.
    pub fn from_env() -> AgentResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset, so `MODEL_NAME=` falls back to the default.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Configuration`] if `FHIR_TIMEOUT_SECS` or `AGENTS_HANDOFF`
    /// cannot be parsed, or [`AgentConfig::new`] rejects the resolved values.
    pub fn from_lookup<F>(lookup: F) -> AgentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let fhir_timeout = match get(ENV_FHIR_TIMEOUT_SECS) {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                AgentError::Configuration(format!("{ENV_FHIR_TIMEOUT_SECS} must be a whole number of seconds, got {raw:?}"))
            })?,
            None => DEFAULT_FHIR_TIMEOUT_SECS,
        };

        let handoff = match get(ENV_HANDOFF) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                AgentError::Configuration(format!("{ENV_HANDOFF} must be true or false, got {raw:?}"))
            })?,
            None => false,
        };

        Self::new(
            get(ENV_API_KEY),
            get(ENV_MODEL_NAME).unwrap_or_else(|| DEFAULT_MODEL_NAME.into()),
            get(ENV_LLM_BASE_URL).unwrap_or_else(|| DEFAULT_LLM_BASE_URL.into()),
            get(ENV_FHIR_BASE_URL).unwrap_or_else(|| DEFAULT_FHIR_BASE_URL.into()),
            Duration::from_secs(fhir_timeout),
            handoff,
        )
    }

    /// Return the model credential, or fail if none is configured.
    pub fn require_credential(&self) -> AgentResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AgentError::Configuration(format!("{ENV_API_KEY} is not set")))
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn llm_base_url(&self) -> &str {
        &self.llm_base_url
    }

    pub fn fhir_base_url(&self) -> &str {
        &self.fhir_base_url
    }

    pub fn fhir_timeout(&self) -> Duration {
        self.fhir_timeout
    }

    /// Whether the pharmacist prompt also carries the clinician's output.
    pub fn handoff(&self) -> bool {
        self.handoff
    }
}

// The credential must never reach logs.
impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("llm_base_url", &self.llm_base_url)
            .field("fhir_base_url", &self.fhir_base_url)
            .field("fhir_timeout", &self.fhir_timeout)
            .field("handoff", &self.handoff)
            .finish()
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
