use thiserror::Error;

/// Local guard failures: checked before a step is allowed, never sent upstream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("no document selected")]
    MissingDocument,

    #[error("no scenario described")]
    MissingScenario,

    #[error("{count} suggestion(s) still pending review")]
    PendingEdits { count: usize },

    #[error("missing values for: {}", .names.join(", "))]
    UnfilledPlaceholders { names: Vec<String> },

    #[error("clause {clause_id} has conflicting accepted changes")]
    ConflictingEdits { clause_id: String },

    #[error("no suggestion #{position} (session has {len})")]
    NoSuchEdit { position: usize, len: usize },

    #[error("invalid date {0:?}: expected YYYY-MM-DD or \"Month D, YYYY\"")]
    InvalidDate(String),

    #[error("invalid assignment {0:?}: expected NAME=VALUE")]
    InvalidAssignment(String),
}
