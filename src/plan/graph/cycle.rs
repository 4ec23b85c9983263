//! Cycle detection for the dependency graph

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoreResult, OrchestratorError};
use crate::models::TaskId;

use super::nodes::TaskNode;

/// Detect circular dependencies using DFS.
///
/// Nodes are visited in task order, so the reported cycle is deterministic.
pub fn detect_cycles(nodes: &BTreeMap<TaskId, TaskNode>) -> CoreResult<()> {
    let mut visited = BTreeSet::new();
    let mut rec_stack = BTreeSet::new();
    let mut path = Vec::new();

    for node_id in nodes.keys() {
        if !visited.contains(node_id) {
            if let Some(cycle) =
                dfs_detect_cycle(nodes, *node_id, &mut visited, &mut rec_stack, &mut path)
            {
                return Err(OrchestratorError::Cycle {
                    path: cycle.iter().map(ToString::to_string).collect(),
                });
            }
        }
    }

    Ok(())
}

fn dfs_detect_cycle(
    nodes: &BTreeMap<TaskId, TaskNode>,
    node_id: TaskId,
    visited: &mut BTreeSet<TaskId>,
    rec_stack: &mut BTreeSet<TaskId>,
    path: &mut Vec<TaskId>,
) -> Option<Vec<TaskId>> {
    visited.insert(node_id);
    rec_stack.insert(node_id);
    path.push(node_id);

    if let Some(node) = nodes.get(&node_id) {
        for dep in &node.dependencies {
            if !visited.contains(dep) {
                if let Some(cycle) = dfs_detect_cycle(nodes, *dep, visited, rec_stack, path) {
                    return Some(cycle);
                }
            } else if rec_stack.contains(dep) {
                // Walk back along the current path to the repeated node
                let mut cycle = vec![*dep];
                for p in path.iter().rev() {
                    cycle.push(*p);
                    if p == dep {
                        break;
                    }
                }
                cycle.reverse();
                return Some(cycle);
            }
        }
    }

    path.pop();
    rec_stack.remove(&node_id);
    None
}
