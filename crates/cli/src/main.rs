//! Command line access to the agent pipeline.
//!
//! Runs against the same configuration as the services (environment or `.env`).

mod channel;

use agent_core::{
    AgentConfig, AgentPipeline, CancelToken, DeliveryChannel, ModelClient, RunOutcome,
};
use agent_types::PatientId;
use api_shared::{live_pipeline, AssessmentRes};
use channel::TerminalChannel;
use clap::{Parser, Subcommand};
use fhir::RecordSource;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "agents")]
#[command(about = "Clinician and pharmacist agents over FHIR records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fact sheet both agents would receive
    Facts {
        /// FHIR patient id
        patient_id: String,
    },
    /// Run both turns and print the normalised assessment
    Assess {
        /// FHIR patient id
        patient_id: String,
        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stream both turns to the terminal; Ctrl-C stops the run
    Stream {
        /// FHIR patient id
        patient_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("agent_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let pipeline = live_pipeline(Arc::new(AgentConfig::from_env()?))?;

    match cli.command {
        Commands::Facts { patient_id } => {
            let patient_id = PatientId::new(&patient_id)?;
            let facts = pipeline.fact_sheet(&patient_id).await?;
            println!("{facts}");
        }
        Commands::Assess { patient_id, json } => {
            let patient_id = PatientId::new(&patient_id)?;
            let assessment = pipeline.assess(&patient_id).await?;
            if json {
                let res = AssessmentRes::new(assessment, chrono::Utc::now());
                println!("{}", serde_json::to_string_pretty(&res)?);
            } else {
                println!("{}", assessment.summary);
            }
        }
        Commands::Stream { patient_id } => {
            let patient_id = PatientId::new(&patient_id)?;
            let cancel = CancelToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        cancel.cancel();
                    }
                }
            });

            let mut channel = TerminalChannel::new(tokio::io::stdout(), tokio::io::stderr(), cancel);
            if !stream_run(&pipeline, &patient_id, &mut channel).await {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Stream one run through `channel` and report whether it succeeded.
///
/// A failed run has already written its error notice through the channel, so the error is
/// only logged here.
async fn stream_run<R, M, C>(
    pipeline: &AgentPipeline<R, M>,
    patient_id: &PatientId,
    channel: &mut C,
) -> bool
where
    R: RecordSource,
    M: ModelClient,
    C: DeliveryChannel,
{
    match pipeline.run(patient_id, channel).await {
        Ok(RunOutcome::Completed(_)) => true,
        Ok(RunOutcome::Cancelled { stage }) => {
            eprintln!("\ninterrupted during {stage:?}");
            true
        }
        Err(err) => {
            tracing::debug!(code = err.code(), "stream run failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{Role, ScriptedModel};
    use fhir::{ClinicalRecordSet, StaticRecords};
    use serde_json::json;

    fn pipeline(model: ScriptedModel) -> AgentPipeline<StaticRecords, ScriptedModel> {
        let records = ClinicalRecordSet::new(
            json!({"resourceType": "Patient", "id": "52664210", "gender": "male"}),
            json!({"resourceType": "Bundle", "entry": []}),
            json!({"resourceType": "Bundle", "entry": []}),
        );
        let config = AgentConfig::from_lookup(|key| {
            (key == "OPENAI_API_KEY").then(|| "sk-test".to_string())
        })
        .expect("config");
        AgentPipeline::new(
            Arc::new(StaticRecords::found(records)),
            Arc::new(model),
            Arc::new(config),
        )
    }

    #[tokio::test]
    async fn failed_stream_reports_error_once() {
        let model = ScriptedModel::new(["Stable."], ["Checking "]).failing(Role::Pharmacist, 1);
        let pipeline = pipeline(model);
        let id = PatientId::new("52664210").expect("id");
        let mut channel = TerminalChannel::new(Vec::new(), Vec::new(), CancelToken::new());

        assert!(!stream_run(&pipeline, &id, &mut channel).await);

        let (out, err) = channel.into_inner();
        let out = String::from_utf8(out).expect("utf8");
        let err = String::from_utf8(err).expect("utf8");
        assert!(out.starts_with("Stable."));
        assert_eq!(err.matches("[error]").count(), 1);
    }

    #[tokio::test]
    async fn completed_stream_succeeds() {
        let pipeline = pipeline(ScriptedModel::new(["Stable."], ["No interactions."]));
        let id = PatientId::new("52664210").expect("id");
        let mut channel = TerminalChannel::new(Vec::new(), Vec::new(), CancelToken::new());

        assert!(stream_run(&pipeline, &id, &mut channel).await);

        let (_, err) = channel.into_inner();
        assert!(!String::from_utf8(err).expect("utf8").contains("[error]"));
    }
}
