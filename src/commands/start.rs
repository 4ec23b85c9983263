//! Claim a task for work
//! Usage: shuttle start <task_id>

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use crate::error::OrchestratorError;
use crate::models::{TaskId, TaskStatus, Transition};

use super::common::{join_ids, Workspace};

/// `pending -> in_progress`, refused while any dependency has not passed.
///
/// The dependency check and the transition happen under the same store
/// lock, so a concurrent `reset` cannot slip in between them.
pub fn run(ws: &Workspace, task_id: &str) -> Result<TaskId> {
    let task = ws.task(task_id)?;
    let id = task.id;

    ws.store.update(|state| {
        let unmet = ws.unmet_dependencies(task, state);
        if !unmet.is_empty() {
            return Err(OrchestratorError::InvalidTransition {
                task: id,
                from: state.status(&id),
                to: TaskStatus::InProgress,
                reason: format!("dependencies not passed: {}", join_ids(&unmet, ", ")),
            }
            .into());
        }
        state.apply(id, Transition::Start, None, Utc::now())?;
        Ok(())
    })?;

    info!(task = %id, "task started");
    Ok(id)
}

pub fn execute(ws: &Workspace, task_id: &str) -> Result<()> {
    run(ws, task_id)?;
    println!("OK");
    Ok(())
}
