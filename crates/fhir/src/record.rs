//! Record set carried through one pipeline invocation, and the retrieval seam.

use agent_types::PatientId;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::sanitize::sanitize;

/// A patient's subject record plus the two related collections consulted by the agents.
///
/// Produced once per invocation by a [`RecordSource`] and never mutated afterwards;
/// [`ClinicalRecordSet::sanitized`] returns a new set.
#[derive(Clone, Debug, PartialEq)]
pub struct ClinicalRecordSet {
    /// The `Patient` resource.
    pub subject: Value,
    /// Search-set `Bundle` of `Condition` resources.
    pub conditions: Value,
    /// Search-set `Bundle` of `MedicationRequest` resources.
    pub medications: Value,
}

impl ClinicalRecordSet {
    pub fn new(subject: Value, conditions: Value, medications: Value) -> Self {
        Self {
            subject,
            conditions,
            medications,
        }
    }

    /// Returns a copy with narrative, metadata, contained resources and extensions removed.
    pub fn sanitized(&self) -> Self {
        Self {
            subject: sanitize(&self.subject),
            conditions: sanitize(&self.conditions),
            medications: sanitize(&self.medications),
        }
    }

    /// Number of entries each collection returned, as reported to callers.
    pub fn source_counts(&self) -> SourceCounts {
        SourceCounts {
            conditions: bundle_entry_count(&self.conditions),
            medications: bundle_entry_count(&self.medications),
        }
    }
}

/// Entry counts of the fetched collections.
///
/// A count is `None` when the collection document does not have the shape of a bundle,
/// so callers can tell "no entries" apart from "unexpected response".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceCounts {
    pub conditions: Option<usize>,
    pub medications: Option<usize>,
}

/// Count the entries in a search-set bundle.
///
/// Servers omit `entry` entirely for empty result sets, so a `Bundle` without it counts as zero.
fn bundle_entry_count(bundle: &Value) -> Option<usize> {
    match bundle.get("entry") {
        Some(Value::Array(entries)) => Some(entries.len()),
        Some(_) => None,
        None if bundle.get("resourceType").and_then(Value::as_str) == Some("Bundle") => Some(0),
        None => None,
    }
}

/// Result of retrieving a patient's record set.
///
/// Callers branch on the tag; "not found" is an expected outcome, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum FetchOutcome {
    Found(ClinicalRecordSet),
    NotFound,
    TransportFailure(String),
}

/// Source of clinical record sets.
///
/// Implementations must be safe to share across concurrent invocations.
pub trait RecordSource: Send + Sync {
    /// Retrieve the subject record and related collections for `patient_id`.
    fn fetch(&self, patient_id: &PatientId) -> impl Future<Output = FetchOutcome> + Send;
}

/// In-memory record source returning a fixed outcome.
///
/// Counts calls so callers can assert whether a retrieval was attempted.
#[derive(Debug)]
pub struct StaticRecords {
    outcome: FetchOutcome,
    calls: AtomicUsize,
}

impl StaticRecords {
    pub fn new(outcome: FetchOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn found(records: ClinicalRecordSet) -> Self {
        Self::new(FetchOutcome::Found(records))
    }

    /// Number of `fetch` calls observed so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecordSource for StaticRecords {
    async fn fetch(&self, _patient_id: &PatientId) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
