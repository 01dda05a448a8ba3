//! # Agent Core
//!
//! Core logic of the clinician/pharmacist agent services.
//!
//! This crate owns everything between a validated patient identifier and delivered text:
//! - Configuration resolved once at startup ([`AgentConfig`])
//! - The language model seam ([`ModelClient`]) and its OpenAI-compatible client
//! - Role prompts built from the FHIR fact sheet
//! - The two-turn [`AgentPipeline`] and its delivery channels
//! - Plain-text normalisation of model output
//!
//! **No API concerns**: HTTP and WebSocket servers belong in `api-rest`, `api-stream` and
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod delivery;
pub mod error;
pub mod llm;
pub mod normalize;
pub mod openai;
pub mod pipeline;
pub mod prompts;
pub mod turn;

pub use config::AgentConfig;
pub use delivery::{Buffered, BufferingChannel, CancelToken, Delivery, DeliveryChannel};
pub use error::{AgentError, AgentResult};
pub use llm::{Fragment, FragmentStream, ModelClient, ScriptedModel};
pub use normalize::normalize;
pub use openai::{decode_stream, OpenAiClient, SseDecoder, SseEvent};
pub use pipeline::{AgentPipeline, Assessment, RunOutcome, Stage, TurnOutputs};
pub use turn::{OutputMode, PipelineTurn, Role};

pub use agent_types::PatientId;
pub use fhir::{FactSheet, FhirClient, SourceCounts};
