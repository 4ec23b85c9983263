//! Context shared across command implementations.
//!
//! Every command is a short-lived invocation: it loads the configuration and
//! the built-in catalog, builds the dependency graph, and opens the progress
//! store. [`Workspace`] bundles those so commands don't each repeat the setup.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::checkpoints::CheckpointManager;
use crate::config::Config;
use crate::fs::ProgressStore;
use crate::git::{GitVcs, VersionControl};
use crate::models::{ProgressState, Task, TaskId, TaskStatus};
use crate::plan::{DependencyGraph, TaskCatalog};
use crate::scheduler::{Directive, Scheduler};
use crate::verify::ShellVerificationRunner;

pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    pub catalog: TaskCatalog,
    pub graph: DependencyGraph,
    pub store: ProgressStore,
}

impl Workspace {
    /// Open the project at `root` with its config and the built-in catalog.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = Config::load(&root)?;
        let catalog = TaskCatalog::builtin()?;
        Self::from_parts(root, config, catalog)
    }

    /// Assemble a workspace from an explicit config and catalog.
    ///
    /// The dependency graph is validated here; a cycle aborts the command.
    pub fn from_parts(root: PathBuf, config: Config, catalog: TaskCatalog) -> Result<Self> {
        let graph = DependencyGraph::build_validated(&catalog)
            .context("Task catalog has a dependency cycle")?;
        let store = ProgressStore::new(config.progress_path(&root));
        debug!(root = %root.display(), tasks = catalog.len(), "workspace opened");
        Ok(Self {
            root,
            config,
            catalog,
            graph,
            store,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a task by its `phase.ordinal` id.
    pub fn task(&self, raw: &str) -> Result<&Task> {
        Ok(self.catalog.resolve(raw)?)
    }

    pub fn scheduler(&self) -> Scheduler<'_> {
        Scheduler::with_policy(&self.graph, self.config.scheduler_policy())
    }

    pub fn max_consecutive_failures(&self) -> u32 {
        self.config.scheduler.max_consecutive_failures
    }

    /// The git repository at the project root.
    pub fn git(&self) -> Result<GitVcs> {
        GitVcs::open(&self.root)
    }

    pub fn checkpoints<'v>(&self, vcs: &'v dyn VersionControl) -> CheckpointManager<'v> {
        CheckpointManager::new(vcs, self.config.project.name.clone())
    }

    pub fn verifier(&self) -> ShellVerificationRunner {
        ShellVerificationRunner::new(&self.root)
            .with_shell(&self.config.verify.shell)
            .with_timeout(self.config.verify_timeout())
    }

    /// Phases that have a checkpoint tag.
    ///
    /// Scheduling still works outside a repository, so a missing or unreadable
    /// repository counts as "no checkpoints".
    pub fn checkpointed_phases(&self, vcs: Option<&dyn VersionControl>) -> BTreeSet<u32> {
        let Some(vcs) = vcs else {
            return BTreeSet::new();
        };
        match self.checkpoints(vcs).checkpointed_phases() {
            Ok(phases) => phases,
            Err(e) => {
                warn!("could not list checkpoints, assuming none: {e:#}");
                BTreeSet::new()
            }
        }
    }

    pub fn next_directive(
        &self,
        progress: &ProgressState,
        vcs: Option<&dyn VersionControl>,
    ) -> Directive {
        self.scheduler()
            .next(progress, &self.checkpointed_phases(vcs))
    }

    /// Dependencies of `task` that have not passed yet.
    pub fn unmet_dependencies(&self, task: &Task, progress: &ProgressState) -> Vec<TaskId> {
        task.dependencies
            .iter()
            .filter(|dep| progress.status(dep) != TaskStatus::Passed)
            .copied()
            .collect()
    }
}

/// Join task ids with `sep`.
pub fn join_ids(ids: &[TaskId], sep: &str) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Truncate a string for single-line display.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}
