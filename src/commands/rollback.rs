//! Roll code and progress back to a checkpoint
//! Usage: shuttle rollback [--to <phase>] [--yes]
//!
//! Without `--yes` only the plan is printed and nothing changes.

use anyhow::{bail, Result};
use colored::Colorize;
use std::fmt::Write as _;

use crate::checkpoints::{RollbackManager, RollbackPlan, RollbackReport};
use crate::git::VersionControl;

use super::common::{join_ids, Workspace};

const MAX_LISTED_COMMITS: usize = 20;

pub fn plan(ws: &Workspace, vcs: &dyn VersionControl, to: Option<u32>) -> Result<RollbackPlan> {
    let checkpoints = ws.checkpoints(vcs);
    RollbackManager::new(&checkpoints, &ws.catalog, &ws.store).plan(to)
}

pub fn apply(ws: &Workspace, vcs: &dyn VersionControl, plan: &RollbackPlan) -> Result<RollbackReport> {
    let checkpoints = ws.checkpoints(vcs);
    RollbackManager::new(&checkpoints, &ws.catalog, &ws.store).execute(plan)
}

pub fn format_plan(plan: &RollbackPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} (phase {}, {})",
        "Rollback target:".bold(),
        plan.target.tag,
        plan.target.phase,
        plan.target.commit.chars().take(8).collect::<String>()
    );
    if let Some(phase) = plan.failed_phase {
        let _ = writeln!(out, "  Earliest failure in phase {phase}");
    }

    if plan.discarded_commits.is_empty() {
        let _ = writeln!(out, "  No commits will be discarded");
    } else {
        let _ = writeln!(
            out,
            "  {} commit(s) will be discarded:",
            plan.discarded_commits.len()
        );
        for commit in plan.discarded_commits.iter().take(MAX_LISTED_COMMITS) {
            let short: String = commit.id.chars().take(8).collect();
            let _ = writeln!(out, "    {} {}", short.yellow(), commit.subject);
        }
        if plan.discarded_commits.len() > MAX_LISTED_COMMITS {
            let _ = writeln!(
                out,
                "    ... and {} more",
                plan.discarded_commits.len() - MAX_LISTED_COMMITS
            );
        }
    }

    if plan.reset_tasks.is_empty() {
        let _ = writeln!(out, "  No tasks will be reset");
    } else {
        let _ = writeln!(
            out,
            "  Tasks reset to pending: {}",
            join_ids(&plan.reset_tasks, ", ")
        );
    }
    for stale in &plan.stale_checkpoints {
        let _ = writeln!(out, "  Checkpoint removed: {}", stale.tag);
    }
    out
}

pub fn format_report(report: &RollbackReport) -> String {
    let mut out = format!("Rolled back to {}\n", report.target.tag);
    if !report.reset_tasks.is_empty() {
        out.push_str(&format!(
            "Reset to pending: {}\n",
            join_ids(&report.reset_tasks, ", ")
        ));
    }
    for tag in &report.deleted_tags {
        out.push_str(&format!("Deleted checkpoint: {tag}\n"));
    }
    out
}

pub fn execute(ws: &Workspace, vcs: &dyn VersionControl, to: Option<u32>, yes: bool) -> Result<()> {
    let plan = plan(ws, vcs, to)?;
    print!("{}", format_plan(&plan));

    if !yes {
        bail!("Rollback discards work; re-run with --yes to confirm");
    }

    let report = apply(ws, vcs, &plan)?;
    print!("{}", format_report(&report));
    Ok(())
}
