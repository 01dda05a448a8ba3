//! FHIR REST retrieval of a patient's record set.

use agent_types::PatientId;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use crate::record::{ClinicalRecordSet, FetchOutcome, RecordSource};
use crate::{FhirResult, MAX_LISTED_ENTRIES, OPERATION_OUTCOME};

const FHIR_JSON: &str = "application/fhir+json";

/// HTTP client for a FHIR server.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct FhirClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

/// A retrieved document with the status it was served with.
struct Retrieved {
    status: StatusCode,
    body: Value,
}

impl FhirClient {
    /// Create a client for the server at `base_url`.
    ///
    /// `timeout` is the budget shared by the three retrievals of one [`RecordSource::fetch`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::FhirError`] if `base_url` is empty or the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> FhirResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(crate::FhirError::InvalidInput(
                "FHIR base URL cannot be empty".into(),
            ));
        }

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.to_string(),
            http,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Retrieved, String> {
        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .header(reqwest::header::ACCEPT, FHIR_JSON)
            .send()
            .await
            .map_err(|e| describe(&url, &e))?;

        let status = response.status();
        let body = match response.json::<Value>().await {
            Ok(body) => body,
            // Some servers answer a missing resource with an HTML or empty body.
            Err(_) if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) => Value::Null,
            Err(e) => return Err(format!("{url}: undecodable body ({status}): {e}")),
        };

        Ok(Retrieved { status, body })
    }

    async fn fetch_all(&self, patient_id: &PatientId) -> FetchOutcome {
        let id = patient_id.as_str();
        let count = MAX_LISTED_ENTRIES.to_string();
        let collection_query = [("patient", id), ("_count", count.as_str())];

        let subject_path = format!("Patient/{id}");
        let (subject, conditions, medications) = tokio::join!(
            self.get(&subject_path, &[]),
            self.get("Condition", &collection_query),
            self.get("MedicationRequest", &collection_query),
        );

        let subject = match subject {
            Ok(doc) if is_not_found(&doc) => return FetchOutcome::NotFound,
            Ok(doc) if doc.status.is_success() => doc.body,
            Ok(doc) => {
                return FetchOutcome::TransportFailure(format!(
                    "Patient/{id} returned {}",
                    doc.status
                ))
            }
            Err(reason) => return FetchOutcome::TransportFailure(reason),
        };

        let conditions = match collection(conditions, "Condition") {
            Ok(body) => body,
            Err(reason) => return FetchOutcome::TransportFailure(reason),
        };
        let medications = match collection(medications, "MedicationRequest") {
            Ok(body) => body,
            Err(reason) => return FetchOutcome::TransportFailure(reason),
        };

        FetchOutcome::Found(ClinicalRecordSet::new(subject, conditions, medications))
    }
}

impl RecordSource for FhirClient {
    async fn fetch(&self, patient_id: &PatientId) -> FetchOutcome {
        tracing::debug!(patient_id = %patient_id, base_url = %self.base_url, "fetching record set");

        let outcome = match tokio::time::timeout(self.timeout, self.fetch_all(patient_id)).await {
            Ok(outcome) => outcome,
            Err(_) => FetchOutcome::TransportFailure(format!(
                "record retrieval timed out after {}s",
                self.timeout.as_secs()
            )),
        };

        match &outcome {
            FetchOutcome::Found(_) => tracing::debug!(patient_id = %patient_id, "record set retrieved"),
            FetchOutcome::NotFound => tracing::info!(patient_id = %patient_id, "patient not found"),
            FetchOutcome::TransportFailure(reason) => {
                tracing::warn!(patient_id = %patient_id, reason = %reason, "record retrieval failed")
            }
        }
        outcome
    }
}

/// The subject read is unresolved when the server answers 404/410 or returns an outcome
/// document instead of the resource.
fn is_not_found(doc: &Retrieved) -> bool {
    matches!(doc.status, StatusCode::NOT_FOUND | StatusCode::GONE)
        || doc.body.get("resourceType").and_then(Value::as_str) == Some(OPERATION_OUTCOME)
}

fn collection(result: Result<Retrieved, String>, resource: &str) -> Result<Value, String> {
    let doc = result?;
    if !doc.status.is_success() {
        return Err(format!("{resource} search returned {}", doc.status));
    }
    Ok(doc.body)
}

fn describe(url: &str, err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("{url}: request timed out")
    } else if err.is_connect() {
        format!("{url}: connection failed")
    } else {
        format!("{url}: {err}")
    }
}
