//! Mark a task as passed
//! Usage: shuttle complete <task_id> [--verify]

use anyhow::{bail, Result};
use colored::Colorize;
use std::fmt;
use tracing::{info, warn};

use crate::git::VersionControl;
use crate::models::{ProgressState, TaskId, TaskStatus};
use crate::verify::{ValidationReport, ValidatorRegistry, VerificationRunner};

use super::common::Workspace;
use super::fail::{self, FailReport};

/// Result of a `complete` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Passed {
        task: TaskId,
        /// False when the task had already passed.
        changed: bool,
        /// Highest phase that became checkpointable with this completion.
        phase_ready: Option<u32>,
        /// Non-blocking findings from file validators.
        warnings: Vec<ValidationReport>,
    },
    /// Verification failed; the task was recorded as failed instead.
    VerificationFailed { message: String, report: FailReport },
}

impl fmt::Display for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Completion::Passed {
                phase_ready: Some(phase),
                ..
            } => write!(f, "CHECKPOINT:{phase}"),
            Completion::Passed { .. } => write!(f, "OK"),
            Completion::VerificationFailed { report, .. } => write!(f, "{report}"),
        }
    }
}

/// `in_progress -> passed`.
///
/// With a verifier, the task's verification command runs first and a failure
/// is recorded through `fail`. Completing an already passed task is a no-op.
/// File validators run over the task's files afterwards; their findings are
/// reported but never change state.
pub fn run(
    ws: &Workspace,
    task_id: &str,
    verifier: Option<&dyn VerificationRunner>,
    validators: Option<&ValidatorRegistry>,
    vcs: Option<&dyn VersionControl>,
) -> Result<Completion> {
    let task = ws.task(task_id)?;
    let id = task.id;

    if ws.store.load()?.status(&id) == TaskStatus::Passed {
        return Ok(Completion::Passed {
            task: id,
            changed: false,
            phase_ready: None,
            warnings: Vec::new(),
        });
    }

    if let Some(verifier) = verifier {
        let outcome = verifier.verify(task)?;
        if !outcome.passed {
            let report = fail::run(ws, task_id, &outcome.message, vcs)?;
            return Ok(Completion::VerificationFailed {
                message: outcome.message,
                report,
            });
        }
        info!(task = %id, "{}", outcome.message);
    }

    // Judged inside the store transaction so that of two racing completions
    // exactly one sees the phase boundary being crossed
    let (changed, phase_ready) = ws.store.complete_and(id, |before, after| {
        match (passed_through(ws, before), passed_through(ws, after)) {
            (old, Some(new)) if old < Some(new) => Some(new),
            _ => None,
        }
    })?;

    let warnings = match validators {
        Some(registry) => match registry.run_file_checks(&ws.root, &task.files) {
            Ok(reports) => reports,
            Err(e) => {
                warn!(task = %id, "file validation could not run: {e:#}");
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    Ok(Completion::Passed {
        task: id,
        changed,
        phase_ready,
        warnings,
    })
}

/// Highest phase such that it and every earlier phase have fully passed.
///
/// Checkpoints are strictly increasing, so a phase only becomes
/// checkpointable once everything before it is done too.
fn passed_through(ws: &Workspace, progress: &ProgressState) -> Option<u32> {
    ws.catalog
        .phases()
        .take_while(|phase| progress.phase_passed(phase))
        .map(|phase| phase.number)
        .last()
}

pub fn execute(
    ws: &Workspace,
    task_id: &str,
    verifier: Option<&dyn VerificationRunner>,
    validators: Option<&ValidatorRegistry>,
    vcs: Option<&dyn VersionControl>,
) -> Result<()> {
    let completion = run(ws, task_id, verifier, validators, vcs)?;

    if let Completion::Passed { warnings, .. } = &completion {
        for report in warnings {
            for finding in report.warnings() {
                eprintln!(
                    "{} [{}] {}",
                    "⚠".yellow().bold(),
                    report.validator,
                    finding.message
                );
            }
        }
    }
    println!("{completion}");

    if let Completion::VerificationFailed { message, .. } = completion {
        bail!("Verification failed for task {task_id}: {message}");
    }
    Ok(())
}
