use std::fmt;

/// The two agents of a run. The clinician always speaks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Clinician,
    Pharmacist,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Clinician => "clinician",
            Role::Pharmacist => "pharmacist",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How model output reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Fragments are pushed as they are produced.
    Stream,
    /// Each turn is collected and delivered once.
    Final,
}

impl OutputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputMode::Stream => "stream",
            OutputMode::Final => "final",
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One model invocation: a role, its system instruction and the task text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTurn {
    pub role: Role,
    pub system: String,
    pub task: String,
    pub mode: OutputMode,
}
