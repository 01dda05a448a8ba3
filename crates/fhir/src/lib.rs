//! FHIR boundary support for the clinician/pharmacist agent services.
//!
//! This crate owns everything that touches the clinical-data server:
//! - retrieval of a patient's record set over FHIR REST ([`FhirClient`])
//! - sanitisation of fetched resources before model exposure ([`sanitize`])
//! - projection of a record set into a bounded plain-text [`FactSheet`]
//!
//! Resources are handled as generic JSON trees (`serde_json::Value`). No FHIR schema is
//! enforced beyond the handful of fields the fact sheet consults, so servers on R4 or R5
//! and resources carrying unknown elements are accepted unchanged.

pub mod client;
pub mod facts;
pub mod record;
pub mod sanitize;

pub use client::FhirClient;
pub use facts::{FactSheet, MAX_LISTED_ENTRIES};
pub use record::{ClinicalRecordSet, FetchOutcome, RecordSource, SourceCounts, StaticRecords};
pub use sanitize::{sanitize, sanitize_in_place};

/// Resource type the server uses to signal an unresolvable read.
pub const OPERATION_OUTCOME: &str = "OperationOutcome";

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
