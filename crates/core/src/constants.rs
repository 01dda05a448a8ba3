//! Defaults and wire strings used throughout the agent core.

/// Model used when `MODEL_NAME` is not configured.
pub const DEFAULT_MODEL_NAME: &str = "gpt-4o";

/// OpenAI-compatible endpoint used when `OPENAI_BASE_URL` is not configured.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Public demo FHIR server used when `FHIR_BASE_URL` is not configured.
pub const DEFAULT_FHIR_BASE_URL: &str = "https://hapi.fhir.org/baseR4";

/// Budget shared by the three record retrievals of one invocation.
pub const DEFAULT_FHIR_TIMEOUT_SECS: u64 = 30;

/// Connect timeout for model calls. Streams themselves are not bounded.
pub const LLM_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Environment variable holding the model credential.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL_NAME: &str = "MODEL_NAME";
pub const ENV_LLM_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_FHIR_BASE_URL: &str = "FHIR_BASE_URL";
pub const ENV_FHIR_TIMEOUT_SECS: &str = "FHIR_TIMEOUT_SECS";
pub const ENV_HANDOFF: &str = "AGENTS_HANDOFF";

/// Prefix of the notice sent when a streaming conversation opens.
pub const CONNECTED_PREFIX: &str = "[connected]";

/// Delimiter sent between the clinician and pharmacist output.
pub const TURN_SEPARATOR: &str = "\n---\n";

/// Notice sent after the pharmacist turn completes.
pub const COMPLETED_NOTICE: &str = "\n\n[done] Done.";

/// Prefix of inline error notices.
pub const ERROR_PREFIX: &str = "[error]";
