//! Error taxonomy for the orchestrator core
//!
//! Pure operations (catalog validation, status transitions, checkpoint and
//! rollback preconditions) return these typed errors. I/O layers wrap them in
//! `anyhow::Error`, so callers can still `downcast_ref::<OrchestratorError>()`.

use thiserror::Error;

use crate::models::{TaskId, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// The task catalog contains a dependency cycle. Fatal: nothing can be scheduled.
    #[error("Circular dependency detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    /// A caller asked for a status change the state machine does not allow.
    #[error("Invalid transition for task {task}: {from} -> {to} ({reason})")]
    InvalidTransition {
        task: TaskId,
        from: TaskStatus,
        to: TaskStatus,
        reason: String,
    },

    /// A checkpoint was requested before every task of the phase passed.
    #[error("Cannot checkpoint phase {phase}: tasks not passed: {}", join_ids(unfinished))]
    NotAllTasksPassed { phase: u32, unfinished: Vec<TaskId> },

    /// Rollback found no checkpoint to return to.
    #[error("No checkpoint exists before phase {before_phase}; use `reset --all` to start over")]
    NoCheckpoint { before_phase: u32 },

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Unknown phase: {0}")]
    UnknownPhase(u32),

    /// The task catalog is malformed (bad ids, dangling or forward dependencies).
    #[error("Invalid task catalog: {0}")]
    InvalidCatalog(String),

    /// `rollback --to <phase>` named a phase that has no checkpoint.
    #[error("No checkpoint exists for phase {phase}")]
    MissingCheckpoint { phase: u32 },

    #[error("Checkpoint for phase {phase} already exists: {tag}")]
    CheckpointExists { phase: u32, tag: String },

    #[error("Cannot checkpoint phase {phase}: a checkpoint for later phase {later} exists")]
    CheckpointOutOfOrder { phase: u32, later: u32 },

    /// A validator rejected its input outright (not just a warning).
    #[error("Blocked by {validator} validator: {reason}")]
    ValidationBlocked { validator: String, reason: String },
}

impl OrchestratorError {
    /// Process exit code the CLI uses for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            OrchestratorError::ValidationBlocked { .. } => 2,
            _ => 1,
        }
    }
}

fn join_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type CoreResult<T> = std::result::Result<T, OrchestratorError>;
