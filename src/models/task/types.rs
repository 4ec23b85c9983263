use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::OrchestratorError;

/// Task identity in `phase.ordinal` form, e.g. `1.1`.
///
/// Ordering is numeric on `(phase, ordinal)`, so `1.10` sorts after `1.9`.
/// Serialized as its string form so it can key JSON objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId {
    phase: u32,
    ordinal: u32,
}

impl TaskId {
    pub fn new(phase: u32, ordinal: u32) -> Self {
        Self { phase, ordinal }
    }

    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.phase, self.ordinal)
    }
}

impl FromStr for TaskId {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OrchestratorError::UnknownTask(s.to_string());

        let (phase, ordinal) = s.trim().split_once('.').ok_or_else(invalid)?;
        let phase: u32 = phase.parse().map_err(|_| invalid())?;
        let ordinal: u32 = ordinal.parse().map_err(|_| invalid())?;
        if phase == 0 || ordinal == 0 {
            return Err(invalid());
        }

        Ok(Self { phase, ordinal })
    }
}

impl TryFrom<String> for TaskId {
    type Error = OrchestratorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

/// Lifecycle status of a task.
///
/// State machine:
/// - `Pending` -> `InProgress` (start)
/// - `InProgress` -> `Passed` (complete) | `Failed` (fail)
/// - `Failed` -> `Pending` (manual retry or rollback)
/// - `Passed` -> `Pending` (rollback only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(alias = "in-progress", alias = "running")]
    InProgress,
    #[serde(alias = "completed")]
    Passed,
    Failed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Passed => write!(f, "passed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A named status change requested by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Start,
    Complete,
    Fail,
    /// Manual retry of a failed task.
    Retry,
    /// Reset performed by rollback; accepted from any status.
    Rollback,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Start => write!(f, "start"),
            Transition::Complete => write!(f, "complete"),
            Transition::Fail => write!(f, "fail"),
            Transition::Retry => write!(f, "reset"),
            Transition::Rollback => write!(f, "rollback"),
        }
    }
}

/// Static definition of a task from the catalog.
///
/// Status is not stored here: it lives in the progress state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub phase: u32,
    pub dependencies: BTreeSet<TaskId>,
    /// Advisory key: tasks sharing a group with no dependency path between
    /// them may be worked on concurrently.
    pub parallel_group: Option<String>,
    /// Shell command the verification runner executes; opaque to the core.
    pub verification_command: String,
    /// Files the task is expected to create or modify.
    pub files: Vec<String>,
    pub requires_docker: bool,
}

impl Task {
    pub fn new(id: TaskId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            phase: id.phase(),
            dependencies: BTreeSet::new(),
            parallel_group: None,
            verification_command: String::new(),
            files: Vec::new(),
            requires_docker: false,
        }
    }

    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies = deps.into_iter().collect();
        self
    }

    pub fn with_parallel_group(mut self, group: impl Into<String>) -> Self {
        self.parallel_group = Some(group.into());
        self
    }

    pub fn with_verification(mut self, command: impl Into<String>) -> Self {
        self.verification_command = command.into();
        self
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }
}
