//! Graph node types for the dependency graph

use std::collections::BTreeSet;

use crate::models::{Task, TaskId};

/// A node in the dependency graph: the scheduling-relevant slice of a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub id: TaskId,
    pub phase: u32,
    pub dependencies: BTreeSet<TaskId>,
    pub parallel_group: Option<String>,
}

impl From<&Task> for TaskNode {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            phase: task.phase,
            dependencies: task.dependencies.clone(),
            parallel_group: task.parallel_group.clone(),
        }
    }
}
