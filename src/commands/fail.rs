//! Record a task failure
//! Usage: shuttle fail <task_id> <message>

use anyhow::Result;
use std::fmt;

use crate::git::VersionControl;
use crate::models::TaskId;
use crate::scheduler::Directive;

use super::common::Workspace;

/// Outcome of recording a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailReport {
    pub task: TaskId,
    pub consecutive_failures: u32,
    pub max_consecutive_failures: u32,
    /// Set when the scheduler now asks for a rollback of this phase.
    pub rollback_phase: Option<u32>,
}

impl fmt::Display for FailReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rollback_phase {
            Some(phase) => write!(f, "ROLLBACK_NEEDED:{phase}"),
            None => write!(
                f,
                "FAILED:{}/{}",
                self.consecutive_failures, self.max_consecutive_failures
            ),
        }
    }
}

/// `in_progress -> failed`, then ask the scheduler whether a rollback is due.
pub fn run(
    ws: &Workspace,
    task_id: &str,
    message: &str,
    vcs: Option<&dyn VersionControl>,
) -> Result<FailReport> {
    let id = ws.task(task_id)?.id;
    let record = ws.store.fail(id, message)?;

    let progress = ws.store.load()?;
    let rollback_phase = match ws.next_directive(&progress, vcs) {
        Directive::RollbackNeeded(phase) => Some(phase),
        _ => None,
    };

    Ok(FailReport {
        task: id,
        consecutive_failures: record.consecutive_failures,
        max_consecutive_failures: ws.max_consecutive_failures(),
        rollback_phase,
    })
}

pub fn execute(
    ws: &Workspace,
    task_id: &str,
    message: &str,
    vcs: Option<&dyn VersionControl>,
) -> Result<()> {
    println!("{}", run(ws, task_id, message, vcs)?);
    Ok(())
}
