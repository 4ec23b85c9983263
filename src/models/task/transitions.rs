use crate::error::{CoreResult, OrchestratorError};

use super::types::{TaskId, TaskStatus, Transition};

impl Transition {
    /// Status a task ends up in after this transition.
    pub fn target(&self) -> TaskStatus {
        match self {
            Transition::Start => TaskStatus::InProgress,
            Transition::Complete => TaskStatus::Passed,
            Transition::Fail => TaskStatus::Failed,
            Transition::Retry | Transition::Rollback => TaskStatus::Pending,
        }
    }
}

impl TaskStatus {
    /// Check if `transition` is allowed from the current status.
    ///
    /// Valid transitions:
    /// - `Pending` -> `InProgress` (start)
    /// - `InProgress` -> `Passed` (complete) | `Failed` (fail)
    /// - `Failed` -> `Pending` (retry)
    /// - any -> `Pending` (rollback)
    ///
    /// Completing a passed task and retrying a pending one are accepted as no-ops.
    pub fn can_apply(&self, transition: Transition) -> bool {
        match (self, transition) {
            (_, Transition::Rollback) => true,
            (TaskStatus::Pending, Transition::Start) => true,
            (TaskStatus::InProgress, Transition::Complete | Transition::Fail) => true,
            (TaskStatus::Passed, Transition::Complete) => true,
            (TaskStatus::Failed | TaskStatus::Pending, Transition::Retry) => true,
            _ => false,
        }
    }

    /// True when applying `transition` leaves the status unchanged.
    pub fn is_noop(&self, transition: Transition) -> bool {
        self.can_apply(transition) && *self == transition.target()
    }

    /// Apply a transition, returning the new status or the precondition that failed.
    pub fn try_apply(&self, task: TaskId, transition: Transition) -> CoreResult<TaskStatus> {
        if self.can_apply(transition) {
            return Ok(transition.target());
        }

        Err(OrchestratorError::InvalidTransition {
            task,
            from: *self,
            to: transition.target(),
            reason: self.rejection_reason(transition),
        })
    }

    fn rejection_reason(&self, transition: Transition) -> String {
        match (self, transition) {
            (_, Transition::Start) => format!("{transition} requires status pending"),
            (_, Transition::Complete) => {
                format!("{transition} requires status in_progress; run `start` first")
            }
            (_, Transition::Fail) => format!("{transition} requires status in_progress"),
            (TaskStatus::Passed, Transition::Retry) => {
                "passed tasks are only reset by rollback".to_string()
            }
            (_, Transition::Retry) => format!("{transition} requires status failed"),
            (_, Transition::Rollback) => "rollback is always permitted".to_string(),
        }
    }
}
