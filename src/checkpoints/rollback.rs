//! Rollback to an earlier checkpoint
//!
//! A rollback is planned first (pure: target selection, affected tasks,
//! discarded commits) and then executed in a fixed order: working tree,
//! progress state, stale tags.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::error::{CoreResult, OrchestratorError};
use crate::fs::ProgressStore;
use crate::git::CommitSummary;
use crate::models::{ProgressState, TaskId, TaskStatus};
use crate::plan::TaskCatalog;

use super::types::Checkpoint;
use super::CheckpointManager;

/// What a rollback would do, computed without side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackPlan {
    pub target: Checkpoint,
    /// Phase of the earliest failed task, if any drove the selection.
    pub failed_phase: Option<u32>,
    /// Every task in a phase after the target, in task order.
    pub reset_tasks: Vec<TaskId>,
    /// Commits between the target and HEAD that the reset discards.
    pub discarded_commits: Vec<CommitSummary>,
    /// Checkpoints for phases after the target; they are deleted.
    pub stale_checkpoints: Vec<Checkpoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub target: Checkpoint,
    /// Tasks whose status actually changed.
    pub reset_tasks: Vec<TaskId>,
    pub deleted_tags: Vec<String>,
}

pub struct RollbackManager<'a> {
    checkpoints: &'a CheckpointManager<'a>,
    catalog: &'a TaskCatalog,
    store: &'a ProgressStore,
}

impl<'a> RollbackManager<'a> {
    pub fn new(
        checkpoints: &'a CheckpointManager<'a>,
        catalog: &'a TaskCatalog,
        store: &'a ProgressStore,
    ) -> Self {
        Self {
            checkpoints,
            catalog,
            store,
        }
    }

    /// Work out what `rollback` would do. `to` forces a specific target phase.
    pub fn plan(&self, to: Option<u32>) -> Result<RollbackPlan> {
        let progress = self.store.load()?;
        let available = self.checkpoints.list()?;
        let target = select_target(&available, self.catalog, &progress, to)?;

        let reset_tasks = self
            .catalog
            .tasks()
            .filter(|t| t.phase > target.phase)
            .map(|t| t.id)
            .collect();
        let stale_checkpoints = available
            .into_iter()
            .filter(|c| c.phase > target.phase)
            .collect();
        let discarded_commits = self
            .checkpoints
            .commits_since(&target)
            .context("Failed to list commits since checkpoint")?;

        Ok(RollbackPlan {
            failed_phase: earliest_failed(self.catalog, &progress).map(|id| id.phase()),
            target,
            reset_tasks,
            discarded_commits,
            stale_checkpoints,
        })
    }

    /// Carry out a plan.
    pub fn execute(&self, plan: &RollbackPlan) -> Result<RollbackReport> {
        let vcs = self.checkpoints.vcs();

        vcs.reset_to(&plan.target.commit)
            .with_context(|| format!("Failed to reset working tree to {}", plan.target.tag))?;
        info!(tag = %plan.target.tag, commit = %plan.target.commit, "working tree reset");

        let reset_tasks = self.store.reset_for_rollback(&plan.reset_tasks)?;
        info!(count = reset_tasks.len(), "task progress reset to pending");

        let mut deleted_tags = Vec::new();
        for stale in &plan.stale_checkpoints {
            match vcs.delete_tag(&stale.tag) {
                Ok(()) => deleted_tags.push(stale.tag.clone()),
                Err(e) => warn!(tag = %stale.tag, "failed to delete stale checkpoint: {e:#}"),
            }
        }

        Ok(RollbackReport {
            target: plan.target.clone(),
            reset_tasks,
            deleted_tags,
        })
    }

    /// Plan and execute in one step.
    pub fn rollback(&self, to: Option<u32>) -> Result<RollbackReport> {
        let plan = self.plan(to)?;
        self.execute(&plan)
    }
}

fn earliest_failed(catalog: &TaskCatalog, progress: &ProgressState) -> Option<TaskId> {
    catalog
        .task_ids()
        .find(|id| progress.status(id) == TaskStatus::Failed)
}

/// Choose the checkpoint to return to.
///
/// With an explicit phase, that phase's checkpoint. Otherwise the latest
/// checkpoint strictly before the anchor phase: the phase of the earliest
/// failed task, else of the earliest unfinished task, else one past the last
/// phase (so a fully passed migration rolls back to its latest checkpoint).
pub fn select_target(
    checkpoints: &[Checkpoint],
    catalog: &TaskCatalog,
    progress: &ProgressState,
    to: Option<u32>,
) -> CoreResult<Checkpoint> {
    if let Some(phase) = to {
        catalog.phase(phase)?;
        return checkpoints
            .iter()
            .find(|c| c.phase == phase)
            .cloned()
            .ok_or(OrchestratorError::MissingCheckpoint { phase });
    }

    let anchor = earliest_failed(catalog, progress)
        .or_else(|| {
            catalog
                .task_ids()
                .find(|id| progress.status(id) != TaskStatus::Passed)
        })
        .map(|id| id.phase())
        .unwrap_or_else(|| catalog.phases().map(|p| p.number + 1).max().unwrap_or(1));

    checkpoints
        .iter()
        .filter(|c| c.phase < anchor)
        .max_by_key(|c| c.phase)
        .cloned()
        .ok_or(OrchestratorError::NoCheckpoint {
            before_phase: anchor,
        })
}
