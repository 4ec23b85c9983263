//! Checkpoint and rollback management
//!
//! This module provides:
//! - Checkpoint tag naming and parsing
//! - [`CheckpointManager`]: create and enumerate phase checkpoints
//! - [`RollbackManager`]: return code and progress to an earlier checkpoint

mod rollback;
mod types;


use anyhow::Result;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::error::OrchestratorError;
use crate::git::{CommitSummary, VersionControl};
use crate::models::ProgressState;
use crate::plan::TaskCatalog;

pub use rollback::{select_target, RollbackManager, RollbackPlan, RollbackReport};
pub use types::{commit_message, parse_phase, tag_name, tag_prefix, Checkpoint};

pub struct CheckpointManager<'a> {
    vcs: &'a dyn VersionControl,
    project: String,
}

impl<'a> CheckpointManager<'a> {
    pub fn new(vcs: &'a dyn VersionControl, project: impl Into<String>) -> Self {
        Self {
            vcs,
            project: project.into(),
        }
    }

    pub(crate) fn vcs(&self) -> &'a dyn VersionControl {
        self.vcs
    }

    /// All checkpoints of this project, ordered by phase.
    pub fn list(&self) -> Result<Vec<Checkpoint>> {
        let mut checkpoints: Vec<Checkpoint> = self
            .vcs
            .list_tags(&tag_prefix(&self.project))?
            .into_iter()
            .filter_map(|tag| match parse_phase(&self.project, &tag.name) {
                Some(phase) => Some(Checkpoint {
                    phase,
                    tag: tag.name,
                    commit: tag.commit,
                }),
                None => {
                    debug!(tag = %tag.name, "ignoring tag that is not a phase checkpoint");
                    None
                }
            })
            .collect();
        checkpoints.sort_by_key(|c| c.phase);
        Ok(checkpoints)
    }

    pub fn find(&self, phase: u32) -> Result<Option<Checkpoint>> {
        Ok(self.list()?.into_iter().find(|c| c.phase == phase))
    }

    /// Phases that have a checkpoint.
    pub fn checkpointed_phases(&self) -> Result<BTreeSet<u32>> {
        Ok(self.list()?.into_iter().map(|c| c.phase).collect())
    }

    /// Create the checkpoint for `phase`.
    ///
    /// Rejected unless every task of this phase and of all earlier phases has
    /// passed, no checkpoint for this phase exists yet, and no later phase has
    /// one. A rollback to the tag keeps earlier phases as passed, so their
    /// work must already be in the tagged commit. Uncommitted changes are
    /// committed first so the tag captures them.
    pub fn create(
        &self,
        catalog: &TaskCatalog,
        progress: &ProgressState,
        phase: u32,
        message: &str,
    ) -> Result<Checkpoint> {
        catalog.phase(phase)?;
        let unfinished: Vec<_> = catalog
            .phases()
            .filter(|p| p.number <= phase)
            .flat_map(|p| progress.unfinished_in(p))
            .collect();
        if !unfinished.is_empty() {
            return Err(OrchestratorError::NotAllTasksPassed { phase, unfinished }.into());
        }

        let existing = self.list()?;
        if let Some(same) = existing.iter().find(|c| c.phase == phase) {
            return Err(OrchestratorError::CheckpointExists {
                phase,
                tag: same.tag.clone(),
            }
            .into());
        }
        if let Some(later) = existing.iter().map(|c| c.phase).filter(|p| *p > phase).max() {
            return Err(OrchestratorError::CheckpointOutOfOrder { phase, later }.into());
        }

        if self.vcs.is_dirty()? {
            let commit = self.vcs.commit_all(&commit_message(phase, message))?;
            debug!(%commit, "committed pending changes for checkpoint");
        }

        let commit = self.vcs.head_commit()?;
        let tag = tag_name(&self.project, phase);
        self.vcs.create_tag(&tag, &commit, message)?;
        info!(%tag, %commit, "checkpoint created");

        Ok(Checkpoint {
            phase,
            tag,
            commit,
        })
    }

    /// Commits made after `checkpoint`, newest first. Informational only.
    pub fn commits_since(&self, checkpoint: &Checkpoint) -> Result<Vec<CommitSummary>> {
        let head = self.vcs.head_commit()?;
        self.vcs.commits_between(&checkpoint.commit, &head)
    }
}
