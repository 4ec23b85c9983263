//! Task catalog: the static, read-only definition of every task and phase
//!
//! The built-in catalog is compiled into the binary from `catalog.toml` and
//! validated once at load time. Nothing mutates it at runtime.

mod schema;
mod validation;


use anyhow::{Context, Result};
use std::collections::BTreeMap;

use crate::error::{CoreResult, OrchestratorError};
use crate::models::{Phase, Task, TaskId};

pub use schema::{CatalogFile, CatalogHeader, PhaseDefinition, TaskDefinition};
pub use validation::CATALOG_VERSION;

const BUILTIN_CATALOG: &str = include_str!("../catalog.toml");

#[derive(Debug, Clone)]
pub struct TaskCatalog {
    phases: BTreeMap<u32, Phase>,
    tasks: BTreeMap<TaskId, Task>,
}

impl TaskCatalog {
    /// Build a catalog from typed phases and tasks.
    ///
    /// Fails with `InvalidCatalog` on structural problems (duplicate ids,
    /// unknown or forward dependencies, undeclared phases). Cycles are
    /// detected by [`crate::plan::DependencyGraph::validate`].
    pub fn new(phases: Vec<Phase>, tasks: Vec<Task>) -> CoreResult<Self> {
        let errors = validation::validate(&phases, &tasks);
        if !errors.is_empty() {
            return Err(OrchestratorError::InvalidCatalog(errors.join("; ")));
        }

        let mut phases: BTreeMap<u32, Phase> = phases.into_iter().map(|p| (p.number, p)).collect();
        let tasks: BTreeMap<TaskId, Task> = tasks.into_iter().map(|t| (t.id, t)).collect();

        for phase in phases.values_mut() {
            phase.tasks = tasks
                .values()
                .filter(|t| t.phase == phase.number)
                .map(|t| t.id)
                .collect();
        }

        Ok(Self { phases, tasks })
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG).context("Built-in task catalog is invalid")
    }

    /// Parse and validate a catalog document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).context("Failed to parse task catalog TOML")?;

        let (phases, tasks) = validation::typed_from_file(&file)
            .map_err(|errors| OrchestratorError::InvalidCatalog(errors.join("; ")))?;

        Ok(Self::new(phases, tasks)?)
    }

    /// Look up a task, failing with `UnknownTask`.
    pub fn get(&self, id: &TaskId) -> CoreResult<&Task> {
        self.tasks
            .get(id)
            .ok_or_else(|| OrchestratorError::UnknownTask(id.to_string()))
    }

    /// Parse a user-supplied id and look the task up.
    pub fn resolve(&self, raw: &str) -> CoreResult<&Task> {
        let id: TaskId = raw.parse()?;
        self.get(&id)
    }

    /// All tasks in `(phase, ordinal)` order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    /// All phases in ascending order.
    pub fn phases(&self) -> impl Iterator<Item = &Phase> {
        self.phases.values()
    }

    pub fn phase(&self, number: u32) -> CoreResult<&Phase> {
        self.phases
            .get(&number)
            .ok_or(OrchestratorError::UnknownPhase(number))
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
