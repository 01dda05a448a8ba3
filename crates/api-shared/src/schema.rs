//! Wire types of the HTTP surfaces.

use agent_core::Assessment;
use chrono::{DateTime, Utc};
use fhir::SourceCounts;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Identity of a running service, served at `/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfoRes {
    pub service: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssessmentReq {
    /// FHIR logical id of the patient.
    #[schema(example = "52664210")]
    pub patient_id: String,
}

/// Entry counts of the source collections. `null` when a collection had an unexpected shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SourcesRes {
    pub conditions: Option<usize>,
    pub medications: Option<usize>,
}

impl From<SourceCounts> for SourcesRes {
    fn from(counts: SourceCounts) -> Self {
        Self {
            conditions: counts.conditions,
            medications: counts.medications,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AssessmentRes {
    pub patient_id: String,
    pub model: String,
    /// Clinician then pharmacist text, separated by a blank line.
    pub summary: String,
    pub clinician: String,
    pub pharmacist: String,
    pub sources: SourcesRes,
    pub generated_at: DateTime<Utc>,
}

impl AssessmentRes {
    pub fn new(assessment: Assessment, generated_at: DateTime<Utc>) -> Self {
        Self {
            patient_id: assessment.patient_id.as_str().to_string(),
            model: assessment.model,
            summary: assessment.summary,
            clinician: assessment.clinician,
            pharmacist: assessment.pharmacist,
            sources: assessment.sources.into(),
            generated_at,
        }
    }
}

/// Structured error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
