//! Scheduling queries: readiness, ancestry, topological order

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{CoreResult, OrchestratorError};
use crate::models::{ProgressState, TaskId, TaskStatus};

use super::nodes::TaskNode;

/// Tasks that can start now.
///
/// A task is ready when its status is `Pending` and every dependency has
/// status `Passed`. Returned in task order.
pub fn ready_set(nodes: &BTreeMap<TaskId, TaskNode>, progress: &ProgressState) -> Vec<TaskId> {
    nodes
        .values()
        .filter(|node| progress.status(&node.id) == TaskStatus::Pending)
        .filter(|node| {
            node.dependencies
                .iter()
                .all(|dep| progress.status(dep) == TaskStatus::Passed)
        })
        .map(|node| node.id)
        .collect()
}

/// All transitive dependencies of `id` (not including `id` itself unless it
/// sits on a cycle).
pub fn ancestors(nodes: &BTreeMap<TaskId, TaskNode>, id: &TaskId) -> BTreeSet<TaskId> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<TaskId> = nodes
        .get(id)
        .map(|n| n.dependencies.iter().copied().collect())
        .unwrap_or_default();

    while let Some(current) = stack.pop() {
        if !seen.insert(current) {
            continue;
        }
        if let Some(node) = nodes.get(&current) {
            stack.extend(node.dependencies.iter().copied());
        }
    }

    seen
}

/// Get a topologically sorted list of tasks (Kahn's algorithm).
///
/// Ties are broken by task order so the result is stable.
pub fn topological_sort(
    nodes: &BTreeMap<TaskId, TaskNode>,
    edges: &BTreeMap<TaskId, Vec<TaskId>>,
) -> CoreResult<Vec<TaskId>> {
    let mut in_degree: BTreeMap<TaskId, usize> = nodes
        .values()
        .map(|node| (node.id, node.dependencies.len()))
        .collect();

    let mut queue: VecDeque<TaskId> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(id, _)| *id)
        .collect();

    let mut result = Vec::with_capacity(nodes.len());

    while let Some(node_id) = queue.pop_front() {
        result.push(node_id);

        if let Some(dependents) = edges.get(&node_id) {
            for dep in dependents {
                if let Some(degree) = in_degree.get_mut(dep) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*dep);
                    }
                }
            }
        }
    }

    if result.len() != nodes.len() {
        let stuck: Vec<String> = in_degree
            .iter()
            .filter(|(_, &degree)| degree > 0)
            .map(|(id, _)| id.to_string())
            .collect();
        return Err(OrchestratorError::Cycle { path: stuck });
    }

    Ok(result)
}
