//! Dependency graph for answering readiness queries over the task catalog

mod cycle;
mod nodes;
mod scheduling;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet};

use crate::error::CoreResult;
use crate::models::{ProgressState, TaskId, TaskStatus};

use super::catalog::TaskCatalog;

pub use nodes::TaskNode;

/// Dependency graph built once per invocation from the catalog.
///
/// Pure: every query is a function of the graph plus the progress snapshot
/// handed in.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Map from task id to node
    nodes: BTreeMap<TaskId, TaskNode>,
    /// Adjacency list: task id -> tasks that depend on it
    edges: BTreeMap<TaskId, Vec<TaskId>>,
    /// Map from parallel group name to member task ids, in task order
    parallel_groups: BTreeMap<String, Vec<TaskId>>,
}

impl DependencyGraph {
    /// Build a graph from the catalog without validating it.
    pub fn build(catalog: &TaskCatalog) -> Self {
        Self::from_nodes(catalog.tasks().map(TaskNode::from))
    }

    /// Build and validate in one step.
    pub fn build_validated(catalog: &TaskCatalog) -> CoreResult<Self> {
        let graph = Self::build(catalog);
        graph.validate()?;
        Ok(graph)
    }

    pub(crate) fn from_nodes(nodes: impl IntoIterator<Item = TaskNode>) -> Self {
        let nodes: BTreeMap<TaskId, TaskNode> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let mut edges: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
        let mut parallel_groups: BTreeMap<String, Vec<TaskId>> = BTreeMap::new();

        for node in nodes.values() {
            edges.entry(node.id).or_default();
            if let Some(group) = &node.parallel_group {
                parallel_groups.entry(group.clone()).or_default().push(node.id);
            }
        }

        // Reverse dependencies
        for node in nodes.values() {
            for dep in &node.dependencies {
                edges.entry(*dep).or_default().push(node.id);
            }
        }

        Self {
            nodes,
            edges,
            parallel_groups,
        }
    }

    /// Fails with `Cycle` if any task transitively depends on itself.
    pub fn validate(&self) -> CoreResult<()> {
        cycle::detect_cycles(&self.nodes)
    }

    pub fn node(&self, id: &TaskId) -> Option<&TaskNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.values()
    }

    /// Tasks that depend directly on `id`.
    pub fn dependents(&self, id: &TaskId) -> &[TaskId] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Pending tasks whose dependencies have all passed, in task order.
    pub fn ready_set(&self, progress: &ProgressState) -> Vec<TaskId> {
        scheduling::ready_set(&self.nodes, progress)
    }

    /// True when no task is ready, some task is still pending and nothing is
    /// in progress: the migration cannot move without operator intervention.
    pub fn is_blocked(&self, progress: &ProgressState) -> bool {
        let any_pending = self.with_status(progress, TaskStatus::Pending).next().is_some();
        let any_running = self
            .with_status(progress, TaskStatus::InProgress)
            .next()
            .is_some();
        any_pending && !any_running && self.ready_set(progress).is_empty()
    }

    /// Failed tasks that are an ancestor of at least one pending task.
    pub fn blocking_failures(&self, progress: &ProgressState) -> Vec<TaskId> {
        let pending: Vec<TaskId> = self.with_status(progress, TaskStatus::Pending).collect();
        self.with_status(progress, TaskStatus::Failed)
            .filter(|failed| pending.iter().any(|p| self.depends_on(p, failed)))
            .collect()
    }

    /// Ids whose current status is `status`, in task order.
    pub fn with_status<'a>(
        &'a self,
        progress: &'a ProgressState,
        status: TaskStatus,
    ) -> impl Iterator<Item = TaskId> + 'a {
        self.nodes
            .keys()
            .copied()
            .filter(move |id| progress.status(id) == status)
    }

    pub fn all_passed(&self, progress: &ProgressState) -> bool {
        self.nodes
            .keys()
            .all(|id| progress.status(id) == TaskStatus::Passed)
    }

    /// Every task `id` depends on, directly or transitively.
    pub fn ancestors(&self, id: &TaskId) -> BTreeSet<TaskId> {
        scheduling::ancestors(&self.nodes, id)
    }

    /// True if `a` depends on `b`, directly or transitively.
    pub fn depends_on(&self, a: &TaskId, b: &TaskId) -> bool {
        self.ancestors(a).contains(b)
    }

    /// True when there is no dependency path between the two tasks in
    /// either direction.
    pub fn independent(&self, a: &TaskId, b: &TaskId) -> bool {
        a != b && !self.depends_on(a, b) && !self.depends_on(b, a)
    }

    /// All tasks in dependency order; ties broken by task order.
    pub fn topological_sort(&self) -> CoreResult<Vec<TaskId>> {
        scheduling::topological_sort(&self.nodes, &self.edges)
    }

    /// Members of a parallel group, in task order.
    pub fn parallel_group(&self, name: &str) -> &[TaskId] {
        self.parallel_groups
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn parallel_group_names(&self) -> impl Iterator<Item = &str> {
        self.parallel_groups.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
