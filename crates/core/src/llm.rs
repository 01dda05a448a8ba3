//! Language model seam.
//!
//! The pipeline talks to models through [`ModelClient`]. [`crate::OpenAiClient`] is the
//! production implementation; [`ScriptedModel`] replays fixed fragments for tests and local
//! runs without a credential.

use crate::turn::{PipelineTurn, Role};
use crate::{AgentError, AgentResult};
use futures_util::stream::{self, BoxStream, StreamExt};
use std::future::Future;
use std::sync::{Mutex, PoisonError};

/// One incremental unit of model output.
///
/// Streaming chunks carry a `delta`; some compatible servers send a whole `message`
/// instead. Chunks with neither (role announcements, finish markers) are `Empty`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Delta(String),
    Content(String),
    Empty,
}

impl Fragment {
    /// Text to deliver, or `None` if the fragment carries nothing.
    pub fn text(&self) -> Option<&str> {
        match self {
            Fragment::Delta(text) | Fragment::Content(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Fragments of one turn, in emission order. An `Err` item ends the turn.
pub type FragmentStream = BoxStream<'static, AgentResult<Fragment>>;

/// A chat model able to stream one turn.
///
/// Implementations are shared read-only across concurrent invocations.
pub trait ModelClient: Send + Sync {
    /// Identifier reported in single-shot responses.
    fn model_name(&self) -> &str;

    /// Start a turn and return its fragment stream.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ModelInvocation`] if the model rejects the request before any
    /// output is produced.
    fn stream(&self, turn: &PipelineTurn) -> impl Future<Output = AgentResult<FragmentStream>> + Send;
}

// ============================================================================
// SCRIPTED MODEL
// ============================================================================

/// Model double replaying fixed fragments per role.
///
/// Records every turn it receives so callers can assert on prompts and call counts.
#[derive(Debug)]
pub struct ScriptedModel {
    name: String,
    clinician: Vec<String>,
    pharmacist: Vec<String>,
    failure: Option<(Role, usize)>,
    turns: Mutex<Vec<PipelineTurn>>,
}

impl ScriptedModel {
    pub fn new<C, P>(clinician: C, pharmacist: P) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            name: "scripted".into(),
            clinician: clinician.into_iter().map(Into::into).collect(),
            pharmacist: pharmacist.into_iter().map(Into::into).collect(),
            failure: None,
            turns: Mutex::new(Vec::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fail `role`'s turn after `after` fragments have been emitted.
    pub fn failing(mut self, role: Role, after: usize) -> Self {
        self.failure = Some((role, after));
        self
    }

    /// Turns received so far, in call order.
    pub fn turns(&self) -> Vec<PipelineTurn> {
        self.turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.turns.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl ModelClient for ScriptedModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    async fn stream(&self, turn: &PipelineTurn) -> AgentResult<FragmentStream> {
        self.turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(turn.clone());

        let script = match turn.role {
            Role::Clinician => &self.clinician,
            Role::Pharmacist => &self.pharmacist,
        };

        let mut items: Vec<AgentResult<Fragment>> = script
            .iter()
            .map(|text| Ok(Fragment::Delta(text.clone())))
            .collect();

        if let Some((role, after)) = self.failure {
            if role == turn.role {
                items.truncate(after);
                items.push(Err(AgentError::ModelInvocation(format!(
                    "scripted {role} failure"
                ))));
            }
        }

        Ok(stream::iter(items).boxed())
    }
}
