//! Migration progress overview
//! Usage: shuttle status

use anyhow::Result;
use colored::Colorize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use tracing::warn;

use crate::checkpoints::Checkpoint;
use crate::git::VersionControl;
use crate::models::{ProgressState, TaskStatus};
use crate::scheduler::Directive;

use super::common::{truncate, Workspace};
use super::indicators::{directive_colored, status_indicator};

const ERROR_PREVIEW_CHARS: usize = 80;

pub fn execute(ws: &Workspace, vcs: Option<&dyn VersionControl>) -> Result<()> {
    let progress = ws.store.load()?;
    let checkpoints = match vcs.map(|vcs| ws.checkpoints(vcs).list()) {
        Some(Ok(list)) => list,
        Some(Err(e)) => {
            warn!("could not list checkpoints: {e:#}");
            Vec::new()
        }
        None => Vec::new(),
    };
    let directive = ws.next_directive(&progress, vcs);
    print!("{}", render(ws, &progress, &checkpoints, &directive));
    Ok(())
}

/// Per-phase task listing followed by totals and the next directive.
pub fn render(
    ws: &Workspace,
    progress: &ProgressState,
    checkpoints: &[Checkpoint],
    directive: &Directive,
) -> String {
    let mut out = String::new();
    let tags: BTreeMap<u32, &str> = checkpoints
        .iter()
        .map(|c| (c.phase, c.tag.as_str()))
        .collect();

    let mut counts: HashMap<TaskStatus, usize> = HashMap::new();
    for task in ws.catalog.tasks() {
        *counts.entry(progress.status(&task.id)).or_default() += 1;
    }
    let passed = counts.get(&TaskStatus::Passed).copied().unwrap_or(0);

    let _ = writeln!(
        out,
        "{} {passed}/{} tasks passed",
        "Migration:".bold(),
        ws.catalog.len()
    );

    for phase in ws.catalog.phases() {
        let done = phase
            .tasks
            .iter()
            .filter(|id| progress.status(id) == TaskStatus::Passed)
            .count();
        let checkpoint = match tags.get(&phase.number) {
            Some(tag) => format!("  {}", tag.green()),
            None => String::new(),
        };
        let _ = writeln!(
            out,
            "\n{} {} [{done}/{}]{checkpoint}",
            format!("Phase {}:", phase.number).bold(),
            phase.name,
            phase.tasks.len()
        );

        for id in &phase.tasks {
            let status = progress.status(id);
            let name = ws
                .catalog
                .get(id)
                .map(|t| t.name.as_str())
                .unwrap_or_default();
            let _ = write!(out, "  {} {:<5} {name}", status_indicator(status), id.to_string());
            if let Some(message) = progress.error_message(id) {
                let _ = write!(
                    out,
                    "  {}",
                    truncate(message, ERROR_PREVIEW_CHARS).red()
                );
            }
            out.push('\n');
        }
    }

    let summary: Vec<String> = [
        TaskStatus::Passed,
        TaskStatus::InProgress,
        TaskStatus::Failed,
        TaskStatus::Pending,
    ]
    .into_iter()
    .filter_map(|s| counts.get(&s).map(|n| format!("{n} {s}")))
    .collect();
    let _ = writeln!(out, "\n{} {}", "Totals:".bold(), summary.join(", "));
    if progress.consecutive_failures > 0 {
        let _ = writeln!(
            out,
            "{} {}/{}",
            "Consecutive failures:".bold(),
            progress.consecutive_failures,
            ws.max_consecutive_failures()
        );
    }
    let _ = writeln!(out, "{} {}", "Next:".bold(), directive_colored(directive));
    out
}
