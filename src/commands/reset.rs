//! Retry a failed task, or discard all progress
//! Usage: shuttle reset <task_id> | shuttle reset --all --yes

use anyhow::{bail, Result};

use super::common::Workspace;

/// Manual retry: `failed -> pending`. Returns false if already pending.
pub fn task(ws: &Workspace, task_id: &str) -> Result<bool> {
    let id = ws.task(task_id)?.id;
    ws.store.reset(id)
}

/// Delete the progress file. Requires confirmation.
pub fn all(ws: &Workspace, yes: bool) -> Result<bool> {
    if !yes {
        bail!("Resetting all progress cannot be undone; re-run with --yes to confirm");
    }
    ws.store.reset_all()
}

pub fn execute(ws: &Workspace, task_id: Option<&str>, all_tasks: bool, yes: bool) -> Result<()> {
    match (task_id, all_tasks) {
        (_, true) => {
            if all(ws, yes)? {
                println!("All progress reset");
            } else {
                println!("No progress to reset");
            }
        }
        (Some(task_id), false) => {
            if task(ws, task_id)? {
                println!("OK");
            } else {
                println!("Task {task_id} is already pending");
            }
        }
        (None, false) => bail!("Specify a task id or --all"),
    }
    Ok(())
}
