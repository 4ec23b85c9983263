//! Full detail for one task
//! Usage: shuttle details <task_id>

use anyhow::Result;
use colored::Colorize;
use std::fmt::Write as _;

use crate::models::{ProgressState, Task};

use super::common::{join_ids, Workspace};
use super::indicators::{status_indicator, status_label};

pub fn execute(ws: &Workspace, task_id: &str) -> Result<()> {
    let task = ws.task(task_id)?;
    let progress = ws.store.load()?;
    print!("{}", render(ws, task, &progress));
    Ok(())
}

pub fn render(ws: &Workspace, task: &Task, progress: &ProgressState) -> String {
    let mut out = String::new();
    let status = progress.status(&task.id);
    let phase_name = ws
        .catalog
        .phase(task.phase)
        .map(|p| p.name.as_str())
        .unwrap_or_default();

    let _ = writeln!(out, "{} {}", format!("Task {}:", task.id).bold(), task.name);
    let _ = writeln!(out, "  Phase:     {} ({phase_name})", task.phase);
    let _ = writeln!(out, "  Status:    {} {}", status_indicator(status), status_label(status));
    if let Some(ts) = progress.entry(&task.id).and_then(|p| p.timestamp) {
        let _ = writeln!(out, "  Updated:   {}", ts.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(message) = progress.error_message(&task.id) {
        let _ = writeln!(out, "  Error:     {}", message.red());
    }

    if task.dependencies.is_empty() {
        let _ = writeln!(out, "  Depends:   (none)");
    } else {
        let deps: Vec<String> = task
            .dependencies
            .iter()
            .map(|d| format!("{}{d}", status_indicator(progress.status(d))))
            .collect();
        let _ = writeln!(out, "  Depends:   {}", deps.join(", "));
        let unmet = ws.unmet_dependencies(task, progress);
        if !unmet.is_empty() {
            let _ = writeln!(out, "  Waiting on: {}", join_ids(&unmet, ", ").yellow());
        }
    }

    let dependents = ws.graph.dependents(&task.id);
    if !dependents.is_empty() {
        let _ = writeln!(out, "  Unblocks:  {}", join_ids(dependents, ", "));
    }
    if let Some(group) = &task.parallel_group {
        let peers: Vec<_> = ws
            .graph
            .parallel_group(group)
            .iter()
            .filter(|id| **id != task.id)
            .copied()
            .collect();
        let _ = writeln!(out, "  Parallel:  {group} (with {})", join_ids(&peers, ", "));
    }

    let command = if task.verification_command.is_empty() {
        "(none)"
    } else {
        task.verification_command.as_str()
    };
    let _ = writeln!(out, "  Verify:    {command}");
    if task.requires_docker {
        let _ = writeln!(out, "  Requires:  docker");
    }
    if !task.files.is_empty() {
        let _ = writeln!(out, "  Files:");
        for file in &task.files {
            let _ = writeln!(out, "    - {file}");
        }
    }
    out
}
