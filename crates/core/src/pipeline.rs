//! Two-turn clinician/pharmacist pipeline.
//!
//! A run moves through `Init → ClinicianTurn → Transition → PharmacistTurn → Done`, or to
//! `Aborted` from any non-terminal stage. All output leaves through a [`DeliveryChannel`],
//! so the same run logic serves streaming and single-shot callers.

use crate::config::AgentConfig;
use crate::delivery::{BufferingChannel, CancelToken, Delivery, DeliveryChannel};
use crate::llm::ModelClient;
use crate::normalize::normalize;
use crate::prompts;
use crate::turn::{OutputMode, PipelineTurn};
use crate::{AgentError, AgentResult};
use agent_types::PatientId;
use fhir::{ClinicalRecordSet, FactSheet, FetchOutcome, RecordSource, SourceCounts};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Stage of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ClinicianTurn,
    Transition,
    PharmacistTurn,
    Done,
    Aborted,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Aborted)
    }

    /// Whether `next` is a legal successor of this stage.
    pub fn can_advance_to(self, next: Stage) -> bool {
        match (self, next) {
            (Stage::Init, Stage::ClinicianTurn)
            | (Stage::ClinicianTurn, Stage::Transition)
            | (Stage::Transition, Stage::PharmacistTurn)
            | (Stage::PharmacistTurn, Stage::Done) => true,
            (current, Stage::Aborted) => !current.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug)]
struct StageTracker {
    current: Stage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: Stage::Init,
        }
    }

    fn advance(&mut self, next: Stage) {
        debug_assert!(
            self.current.can_advance_to(next),
            "illegal stage transition {:?} -> {:?}",
            self.current,
            next
        );
        tracing::debug!(from = ?self.current, to = ?next, "stage transition");
        self.current = next;
    }
}

/// Raw text of both turns plus source entry counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutputs {
    pub clinician: String,
    pub pharmacist: String,
    pub sources: SourceCounts,
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(TurnOutputs),
    /// The caller went away; nothing further was issued after `stage`.
    Cancelled { stage: Stage },
}

/// Normalised single-shot result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub patient_id: PatientId,
    pub model: String,
    pub clinician: String,
    pub pharmacist: String,
    /// Clinician text, a blank line, then pharmacist text.
    pub summary: String,
    pub sources: SourceCounts,
}

/// Orchestrates record retrieval and both agent turns.
///
/// Dependencies are explicit and shared read-only, so one pipeline serves any number of
/// concurrent runs.
pub struct AgentPipeline<R, M> {
    records: Arc<R>,
    model: Arc<M>,
    config: Arc<AgentConfig>,
}

impl<R, M> Clone for AgentPipeline<R, M> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            model: Arc::clone(&self.model),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R, M> AgentPipeline<R, M>
where
    R: RecordSource,
    M: ModelClient,
{
    pub fn new(records: Arc<R>, model: Arc<M>, config: Arc<AgentConfig>) -> Self {
        Self {
            records,
            model,
            config,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run both turns for `patient_id`, delivering output through `channel`.
    ///
    /// The channel is closed exactly once whatever the outcome. In stream mode a failure is
    /// also delivered as an inline error notice after any fragments already sent; nothing
    /// is delivered once the channel's token is cancelled.
    ///
    /// # Arguments
    ///
    /// * `patient_id` - Validated subject identifier.
    /// * `channel` - Destination of the run's output.
    ///
    /// # Returns
    ///
    /// [`RunOutcome::Completed`] with raw turn text, or [`RunOutcome::Cancelled`] if the
    /// channel's token fired.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`AgentError::Configuration`] if no model credential is configured (checked before
    ///   any outbound call),
    /// - [`AgentError::RecordNotFound`] or [`AgentError::Transport`] from record retrieval,
    /// - [`AgentError::ModelInvocation`] if either turn fails.
    pub async fn run<C>(&self, patient_id: &PatientId, channel: &mut C) -> AgentResult<RunOutcome>
    where
        C: DeliveryChannel,
    {
        let run_id = Uuid::new_v4();
        let mode = channel.mode();
        let span = tracing::info_span!(
            "pipeline",
            %run_id,
            patient_id = %patient_id,
            mode = %mode
        );

        async move {
            tracing::info!("run started");
            let cancel = channel.cancellation();
            let mut stage = StageTracker::new();

            let result = self.drive(patient_id, channel, &cancel, &mut stage).await;

            let outcome = match result {
                Ok(outputs) => {
                    stage.advance(Stage::Done);
                    if mode == OutputMode::Stream && !cancel.is_cancelled() {
                        channel.deliver(Delivery::Completed).await;
                    }
                    tracing::info!(
                        clinician_chars = outputs.clinician.len(),
                        pharmacist_chars = outputs.pharmacist.len(),
                        "run completed"
                    );
                    Ok(RunOutcome::Completed(outputs))
                }
                Err(AgentError::Cancelled) => {
                    let at = stage.current;
                    stage.advance(Stage::Aborted);
                    tracing::info!(stage = ?at, "run cancelled by caller");
                    Ok(RunOutcome::Cancelled { stage: at })
                }
                Err(err) => {
                    stage.advance(Stage::Aborted);
                    tracing::warn!(code = err.code(), error = %err, "run aborted");
                    if mode == OutputMode::Stream && !cancel.is_cancelled() {
                        channel.deliver(Delivery::Failure(&err)).await;
                    }
                    Err(err)
                }
            };

            channel.close().await;
            outcome
        }
        .instrument(span)
        .await
    }

    /// Run in final mode and return normalised text.
    ///
    /// # Errors
    ///
    /// Same as [`AgentPipeline::run`].
    pub async fn assess(&self, patient_id: &PatientId) -> AgentResult<Assessment> {
        let mut channel = BufferingChannel::new();
        let outputs = match self.run(patient_id, &mut channel).await? {
            RunOutcome::Completed(outputs) => outputs,
            RunOutcome::Cancelled { .. } => return Err(AgentError::Cancelled),
        };

        let buffered = channel.finish();
        let clinician = normalize(&buffered.clinician);
        let pharmacist = normalize(&buffered.pharmacist);
        let summary = [clinician.as_str(), pharmacist.as_str()]
            .into_iter()
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(Assessment {
            patient_id: patient_id.clone(),
            model: self.model.model_name().to_string(),
            clinician,
            pharmacist,
            summary,
            sources: outputs.sources,
        })
    }

    /// Retrieve and project records without running any turn.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::RecordNotFound`] or [`AgentError::Transport`].
    pub async fn fact_sheet(&self, patient_id: &PatientId) -> AgentResult<FactSheet> {
        let records = self.fetch(patient_id, &CancelToken::new()).await?;
        Ok(FactSheet::from_records(&records))
    }

    async fn drive<C>(
        &self,
        patient_id: &PatientId,
        channel: &mut C,
        cancel: &CancelToken,
        stage: &mut StageTracker,
    ) -> AgentResult<TurnOutputs>
    where
        C: DeliveryChannel,
    {
        let mode = channel.mode();
        if mode == OutputMode::Stream {
            channel.deliver(Delivery::Connected(patient_id)).await;
        }

        self.config.require_credential()?;

        let records = self.fetch(patient_id, cancel).await?;
        let sources = records.source_counts();
        let facts = FactSheet::from_records(&records);
        tracing::debug!(
            conditions = facts.conditions().len(),
            medications = facts.medications().len(),
            "facts extracted"
        );

        stage.advance(Stage::ClinicianTurn);
        let clinician = self
            .turn(prompts::clinician_turn(&facts, mode), channel, cancel)
            .await?;

        stage.advance(Stage::Transition);
        ensure_active(cancel)?;
        if mode == OutputMode::Stream {
            channel.deliver(Delivery::Separator).await;
        }

        stage.advance(Stage::PharmacistTurn);
        let handoff = self.config.handoff().then_some(clinician.as_str());
        let pharmacist = self
            .turn(prompts::pharmacist_turn(&facts, mode, handoff), channel, cancel)
            .await?;

        Ok(TurnOutputs {
            clinician,
            pharmacist,
            sources,
        })
    }

    async fn fetch(&self, patient_id: &PatientId, cancel: &CancelToken) -> AgentResult<ClinicalRecordSet> {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            outcome = self.records.fetch(patient_id) => outcome,
        };

        match outcome {
            FetchOutcome::Found(records) => Ok(records.sanitized()),
            FetchOutcome::NotFound => Err(AgentError::RecordNotFound(patient_id.clone())),
            FetchOutcome::TransportFailure(reason) => Err(AgentError::Transport(reason)),
        }
    }

    /// Run one turn. Stream mode forwards each fragment as it arrives; final mode delivers
    /// the accumulated text once.
    async fn turn<C>(&self, turn: PipelineTurn, channel: &mut C, cancel: &CancelToken) -> AgentResult<String>
    where
        C: DeliveryChannel,
    {
        let role = turn.role;
        let mode = turn.mode;

        let mut fragments = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            stream = self.model.stream(&turn) => stream?,
        };

        let mut text = String::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                next = fragments.next() => next,
            };
            let Some(fragment) = next else {
                break;
            };
            let fragment = fragment?;
            let Some(piece) = fragment.text() else {
                continue;
            };

            text.push_str(piece);
            if mode == OutputMode::Stream {
                channel.deliver(Delivery::Fragment { role, text: piece }).await;
            }
        }

        if mode == OutputMode::Final {
            channel.deliver(Delivery::Fragment { role, text: &text }).await;
        }

        tracing::debug!(%role, chars = text.len(), "turn finished");
        Ok(text)
    }
}

fn ensure_active(cancel: &CancelToken) -> AgentResult<()> {
    if cancel.is_cancelled() {
        Err(AgentError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedModel;
    use crate::turn::Role;
    use fhir::StaticRecords;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Connected,
        Fragment(Role, String),
        Separator,
        Completed,
        Failure(&'static str),
    }

    /// Channel recording every delivery; optionally cancels after N fragments.
    struct RecordingChannel {
        mode: OutputMode,
        cancel: CancelToken,
        cancel_after: Option<usize>,
        events: Vec<Event>,
        closes: usize,
    }

    impl RecordingChannel {
        fn new(mode: OutputMode) -> Self {
            Self {
                mode,
                cancel: CancelToken::new(),
                cancel_after: None,
                events: Vec::new(),
                closes: 0,
            }
        }

        fn cancelling_after(mut self, fragments: usize) -> Self {
            self.cancel_after = Some(fragments);
            self
        }

        fn fragments(&self, role: Role) -> Vec<String> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    Event::Fragment(r, text) if *r == role => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, event: &Event) -> usize {
            self.events.iter().filter(|e| *e == event).count()
        }
    }

    impl DeliveryChannel for RecordingChannel {
        fn mode(&self) -> OutputMode {
            self.mode
        }

        fn cancellation(&self) -> CancelToken {
            self.cancel.clone()
        }

        async fn deliver(&mut self, delivery: Delivery<'_>) {
            let event = match delivery {
                Delivery::Connected(_) => Event::Connected,
                Delivery::Fragment { role, text } => Event::Fragment(role, text.to_string()),
                Delivery::Separator => Event::Separator,
                Delivery::Completed => Event::Completed,
                Delivery::Failure(err) => Event::Failure(err.code()),
            };
            self.events.push(event);

            let delivered = self
                .events
                .iter()
                .filter(|e| matches!(e, Event::Fragment(..)))
                .count();
            if self.cancel_after == Some(delivered) {
                self.cancel.cancel();
            }
        }

        async fn close(&mut self) {
            self.closes += 1;
        }
    }

    fn records() -> ClinicalRecordSet {
        ClinicalRecordSet::new(
            json!({
                "resourceType": "Patient",
                "id": "52664210",
                "gender": "male",
                "birthDate": "1970-01-01",
                "meta": {"versionId": "3"},
                "text": {"status": "generated", "div": "<div>narrative</div>"}
            }),
            json!({"resourceType": "Bundle", "entry": [
                {"resource": {"code": {"text": "Hypertension"}}},
                {"resource": {"code": {"coding": [{"display": "Asthma"}]}}}
            ]}),
            json!({"resourceType": "Bundle", "entry": [
                {"resource": {"medicationCodeableConcept": {"text": "Metformin"}}}
            ]}),
        )
    }

    fn config(pairs: &[(&'static str, &'static str)]) -> Arc<AgentConfig> {
        let pairs = pairs.to_vec();
        Arc::new(
            AgentConfig::from_lookup(move |key| {
                pairs
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v.to_string())
            })
            .expect("config"),
        )
    }

    fn with_key() -> Arc<AgentConfig> {
        config(&[("OPENAI_API_KEY", "sk-test")])
    }

    fn pipeline(
        records: StaticRecords,
        model: ScriptedModel,
        config: Arc<AgentConfig>,
    ) -> (AgentPipeline<StaticRecords, ScriptedModel>, Arc<StaticRecords>, Arc<ScriptedModel>) {
        let records = Arc::new(records);
        let model = Arc::new(model);
        let pipeline = AgentPipeline::new(Arc::clone(&records), Arc::clone(&model), config);
        (pipeline, records, model)
    }

    fn id() -> PatientId {
        PatientId::new("52664210").expect("id")
    }

    fn scripted() -> ScriptedModel {
        ScriptedModel::new(["The patient ", "has hypertension."], ["Metformin ", "is low risk."])
    }

    #[tokio::test]
    async fn happy_path_stream_trace() {
        let (pipeline, _, model) = pipeline(StaticRecords::found(records()), scripted(), with_key());
        let mut channel = RecordingChannel::new(OutputMode::Stream);

        let outcome = pipeline.run(&id(), &mut channel).await.expect("run");

        assert_eq!(channel.events.first(), Some(&Event::Connected));
        assert_eq!(channel.events.last(), Some(&Event::Completed));
        assert_eq!(channel.count(&Event::Separator), 1);
        assert_eq!(channel.count(&Event::Completed), 1);
        assert_eq!(channel.closes, 1);
        assert!(!channel.fragments(Role::Clinician).is_empty());
        assert!(!channel.fragments(Role::Pharmacist).is_empty());
        assert_eq!(model.calls(), 2);

        match outcome {
            RunOutcome::Completed(outputs) => {
                assert_eq!(outputs.clinician, "The patient has hypertension.");
                assert_eq!(outputs.pharmacist, "Metformin is low risk.");
                assert_eq!(outputs.sources.conditions, Some(2));
                assert_eq!(outputs.sources.medications, Some(1));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn clinician_fragments_precede_pharmacist_fragments() {
        let (pipeline, _, _) = pipeline(StaticRecords::found(records()), scripted(), with_key());
        let mut channel = RecordingChannel::new(OutputMode::Stream);
        pipeline.run(&id(), &mut channel).await.expect("run");

        let separator = channel
            .events
            .iter()
            .position(|e| *e == Event::Separator)
            .expect("separator");
        for (index, event) in channel.events.iter().enumerate() {
            match event {
                Event::Fragment(Role::Clinician, _) => assert!(index < separator),
                Event::Fragment(Role::Pharmacist, _) => assert!(index > separator),
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn both_turns_receive_the_same_facts() {
        let (pipeline, _, model) = pipeline(StaticRecords::found(records()), scripted(), with_key());
        let mut channel = RecordingChannel::new(OutputMode::Stream);
        pipeline.run(&id(), &mut channel).await.expect("run");

        let turns = model.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::Clinician);
        assert_eq!(turns[1].role, Role::Pharmacist);
        for turn in &turns {
            assert!(turn.task.contains("Patient ID: 52664210"));
            assert!(turn.task.contains("Conditions (2): Hypertension; Asthma"));
            assert!(turn.task.contains("Medications (1): Metformin"));
            assert!(!turn.task.contains("narrative"));
        }
        assert!(!turns[1].task.contains("has hypertension"));
    }

    #[tokio::test]
    async fn handoff_passes_clinician_output_to_pharmacist() {
        let config = config(&[("OPENAI_API_KEY", "sk-test"), ("AGENTS_HANDOFF", "true")]);
        let (pipeline, _, model) = pipeline(StaticRecords::found(records()), scripted(), config);
        let mut channel = RecordingChannel::new(OutputMode::Stream);
        pipeline.run(&id(), &mut channel).await.expect("run");

        assert!(model.turns()[1]
            .task
            .contains("Clinician summary:\nThe patient has hypertension."));
    }

    #[tokio::test]
    async fn not_found_aborts_without_model_turn() {
        let (pipeline, _, model) = pipeline(StaticRecords::new(FetchOutcome::NotFound), scripted(), with_key());
        let mut channel = RecordingChannel::new(OutputMode::Stream);

        let err = pipeline.run(&id(), &mut channel).await.expect_err("not found");

        assert!(matches!(err, AgentError::RecordNotFound(_)));
        assert_eq!(channel.events, vec![Event::Connected, Event::Failure("NOT_FOUND")]);
        assert_eq!(channel.closes, 1);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn not_found_in_final_mode_has_no_summary() {
        let (pipeline, _, model) = pipeline(StaticRecords::new(FetchOutcome::NotFound), scripted(), with_key());
        let err = pipeline.assess(&id()).await.expect_err("not found");
        assert!(matches!(err, AgentError::RecordNotFound(ref p) if p.as_str() == "52664210"));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_distinct() {
        let (pipeline, _, model) = pipeline(
            StaticRecords::new(FetchOutcome::TransportFailure("timed out".into())),
            scripted(),
            with_key(),
        );
        let mut channel = RecordingChannel::new(OutputMode::Stream);

        let err = pipeline.run(&id(), &mut channel).await.expect_err("transport");

        assert!(matches!(err, AgentError::Transport(ref reason) if reason == "timed out"));
        assert_eq!(channel.events, vec![Event::Connected, Event::Failure("TRANSPORT_FAILURE")]);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_call() {
        let (pipeline, records, model) = pipeline(StaticRecords::found(records()), scripted(), config(&[]));
        let mut channel = RecordingChannel::new(OutputMode::Stream);

        let err = pipeline.run(&id(), &mut channel).await.expect_err("configuration");

        assert!(matches!(err, AgentError::Configuration(_)));
        assert_eq!(records.calls(), 0);
        assert_eq!(model.calls(), 0);
        assert_eq!(
            channel.events,
            vec![Event::Connected, Event::Failure("CONFIGURATION_ERROR")]
        );
        assert_eq!(channel.closes, 1);
    }

    #[tokio::test]
    async fn model_failure_appends_notice_after_delivered_fragments() {
        let model = scripted().failing(Role::Pharmacist, 1);
        let (pipeline, _, _) = pipeline(StaticRecords::found(records()), model, with_key());
        let mut channel = RecordingChannel::new(OutputMode::Stream);

        let err = pipeline.run(&id(), &mut channel).await.expect_err("model failure");

        assert!(matches!(err, AgentError::ModelInvocation(_)));
        assert_eq!(channel.fragments(Role::Clinician).len(), 2);
        assert_eq!(channel.fragments(Role::Pharmacist), vec!["Metformin ".to_string()]);
        assert_eq!(channel.events.last(), Some(&Event::Failure("MODEL_FAILURE")));
        assert_eq!(channel.count(&Event::Completed), 0);
        assert_eq!(channel.closes, 1);
    }

    #[tokio::test]
    async fn peer_cancellation_stops_further_turns() {
        let (pipeline, _, model) = pipeline(StaticRecords::found(records()), scripted(), with_key());
        let mut channel = RecordingChannel::new(OutputMode::Stream).cancelling_after(1);

        let outcome = pipeline.run(&id(), &mut channel).await.expect("cancelled run");

        assert_eq!(
            outcome,
            RunOutcome::Cancelled {
                stage: Stage::ClinicianTurn
            }
        );
        assert_eq!(model.calls(), 1);
        assert_eq!(channel.fragments(Role::Clinician).len(), 1);
        assert_eq!(channel.count(&Event::Separator), 0);
        assert!(!channel.events.iter().any(|e| matches!(e, Event::Failure(_))));
        assert_eq!(channel.closes, 1);
    }

    #[tokio::test]
    async fn cancellation_before_fetch_issues_nothing() {
        let (pipeline, records, model) = pipeline(StaticRecords::found(records()), scripted(), with_key());
        let mut channel = RecordingChannel::new(OutputMode::Stream);
        channel.cancel.cancel();

        let outcome = pipeline.run(&id(), &mut channel).await.expect("cancelled run");

        assert_eq!(outcome, RunOutcome::Cancelled { stage: Stage::Init });
        assert_eq!(records.calls(), 0);
        assert_eq!(model.calls(), 0);
        assert_eq!(channel.closes, 1);
    }

    #[tokio::test]
    async fn final_mode_delivers_each_turn_once() {
        let (pipeline, _, _) = pipeline(StaticRecords::found(records()), scripted(), with_key());
        let mut channel = RecordingChannel::new(OutputMode::Final);
        pipeline.run(&id(), &mut channel).await.expect("run");

        assert_eq!(
            channel.events,
            vec![
                Event::Fragment(Role::Clinician, "The patient has hypertension.".into()),
                Event::Fragment(Role::Pharmacist, "Metformin is low risk.".into()),
            ]
        );
        assert_eq!(channel.closes, 1);
    }

    #[tokio::test]
    async fn assess_returns_normalised_text() {
        let model = ScriptedModel::new(["**Stable** ", "patient."], ["- *No* interactions."])
            .with_name("gpt-4o");
        let (pipeline, _, model) = pipeline(StaticRecords::found(records()), model, with_key());

        let assessment = pipeline.assess(&id()).await.expect("assessment");

        assert_eq!(assessment.model, "gpt-4o");
        assert_eq!(assessment.clinician, "Stable patient.");
        assert_eq!(assessment.pharmacist, "No interactions.");
        assert_eq!(assessment.summary, "Stable patient.\n\nNo interactions.");
        assert_eq!(assessment.sources.conditions, Some(2));
        assert!(model.turns().iter().all(|t| t.mode == OutputMode::Final));
    }

    #[tokio::test]
    async fn fact_sheet_needs_no_credential() {
        let (pipeline, _, model) = pipeline(StaticRecords::found(records()), scripted(), config(&[]));
        let facts = pipeline.fact_sheet(&id()).await.expect("facts");
        assert_eq!(facts.medications().to_vec(), vec!["Metformin".to_string()]);
        assert_eq!(model.calls(), 0);
    }

    #[test]
    fn stage_transitions() {
        assert!(Stage::Init.can_advance_to(Stage::ClinicianTurn));
        assert!(Stage::PharmacistTurn.can_advance_to(Stage::Done));
        assert!(Stage::Transition.can_advance_to(Stage::Aborted));
        assert!(!Stage::Init.can_advance_to(Stage::PharmacistTurn));
        assert!(!Stage::Done.can_advance_to(Stage::Aborted));
        assert!(!Stage::Aborted.can_advance_to(Stage::Aborted));
    }
}
