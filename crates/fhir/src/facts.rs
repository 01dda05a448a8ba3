//! Deterministic plain-text projection of a record set.
//!
//! The fact sheet replaces raw resources in model prompts: it is bounded in size, stable
//! for a given record set, and never fails on missing fields. Absent scalars render as
//! `unknown`, empty lists as `none`.

use serde_json::Value;
use std::fmt;

use crate::record::ClinicalRecordSet;

/// Maximum number of collection entries consulted per list.
pub const MAX_LISTED_ENTRIES: usize = 10;

const UNKNOWN: &str = "unknown";
const NONE: &str = "none";

/// Compact fact sheet handed to both agent turns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FactSheet {
    patient_id: Option<String>,
    gender: Option<String>,
    birth_date: Option<String>,
    conditions: Vec<String>,
    medications: Vec<String>,
}

impl FactSheet {
    /// Extract facts from a (sanitised) record set.
    ///
    /// Condition labels come from `code`, medication labels from
    /// `medicationCodeableConcept`. For each, the concept's `text` is preferred, then the
    /// first coding's `display`; an entry with neither is skipped. Only the first
    /// [`MAX_LISTED_ENTRIES`] bundle entries are consulted.
    pub fn from_records(records: &ClinicalRecordSet) -> Self {
        Self {
            patient_id: scalar(&records.subject, "id"),
            gender: scalar(&records.subject, "gender"),
            birth_date: scalar(&records.subject, "birthDate"),
            conditions: labels(&records.conditions, "code"),
            medications: labels(&records.medications, "medicationCodeableConcept"),
        }
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn medications(&self) -> &[String] {
        &self.medications
    }

    /// Render as the multi-line block embedded in prompts.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FactSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Patient ID: {}", or_unknown(&self.patient_id))?;
        writeln!(f, "Gender: {}", or_unknown(&self.gender))?;
        writeln!(f, "Birth date: {}", or_unknown(&self.birth_date))?;
        writeln!(
            f,
            "Conditions ({}): {}",
            self.conditions.len(),
            join_or_none(&self.conditions)
        )?;
        write!(
            f,
            "Medications ({}): {}",
            self.medications.len(),
            join_or_none(&self.medications)
        )
    }
}

fn or_unknown(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(UNKNOWN)
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        NONE.to_string()
    } else {
        items.join("; ")
    }
}

/// Read a scalar field as text. Numbers are accepted since some servers emit numeric ids.
fn scalar(resource: &Value, key: &str) -> Option<String> {
    match resource.get(key)? {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn labels(bundle: &Value, concept_key: &str) -> Vec<String> {
    let Some(entries) = bundle.get("entry").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .take(MAX_LISTED_ENTRIES)
        .filter_map(|entry| entry.get("resource"))
        .filter_map(|resource| resource.get(concept_key))
        .filter_map(concept_label)
        .collect()
}

/// Label of a `CodeableConcept`: `text`, else `coding[0].display`.
fn concept_label(concept: &Value) -> Option<String> {
    concept
        .get("text")
        .and_then(Value::as_str)
        .and_then(non_blank)
        .or_else(|| {
            concept
                .get("coding")
                .and_then(Value::as_array)
                .and_then(|codings| codings.first())
                .and_then(|coding| coding.get("display"))
                .and_then(Value::as_str)
                .and_then(non_blank)
        })
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
