//! Role prompts for the clinician and pharmacist turns.
//!
//! Both turns are built from the same rendered fact sheet. The pharmacist only sees the
//! clinician's output when hand-off is enabled.

use crate::turn::{OutputMode, PipelineTurn, Role};
use fhir::FactSheet;

const CLINICIAN_SYSTEM: &str = "You are a careful clinician. Use only the provided facts. \
If information is missing, clearly say 'unknown'. Never invent facts. Be concise.";

const PHARMACIST_SYSTEM: &str = "You are a pharmacist focused on medication safety and \
interactions. If medications are absent or unclear, state that plainly and avoid \
speculation. Be concise.";

const CLINICIAN_TASK: &str = "Write a concise clinical summary of the patient below in 3 to 6 \
sentences. Include demographics if present and the key conditions. Mark anything missing \
as unknown.";

const PHARMACIST_TASK: &str = "Write a short medication safety review of the patient below in \
2 to 5 sentences. Flag interactions and contraindications and call out unknowns.";

const PLAIN_TEXT_RULE: &str = "Output plain text only: no markdown, no headings, no bullets, \
no asterisks.";

/// Build the clinician turn for `facts`.
pub fn clinician_turn(facts: &FactSheet, mode: OutputMode) -> PipelineTurn {
    PipelineTurn {
        role: Role::Clinician,
        system: system_text(CLINICIAN_SYSTEM),
        task: format!("{CLINICIAN_TASK}\n\n{}", facts.render()),
        mode,
    }
}

/// Build the pharmacist turn for `facts`.
///
/// # Arguments
///
/// * `facts` - The same fact sheet the clinician received.
/// * `mode` - Output mode of the run.
/// * `handoff` - The clinician's full output, when hand-off is enabled.
pub fn pharmacist_turn(facts: &FactSheet, mode: OutputMode, handoff: Option<&str>) -> PipelineTurn {
    let mut task = format!("{PHARMACIST_TASK}\n\n{}", facts.render());
    if let Some(summary) = handoff.map(str::trim).filter(|s| !s.is_empty()) {
        task.push_str("\n\nClinician summary:\n");
        task.push_str(summary);
    }

    PipelineTurn {
        role: Role::Pharmacist,
        system: system_text(PHARMACIST_SYSTEM),
        task,
        mode,
    }
}

fn system_text(base: &str) -> String {
    format!("{base} {PLAIN_TEXT_RULE}")
}
