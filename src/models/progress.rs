//! Progress state: the persisted record of each task's status
//!
//! This is plain data plus pure transition logic. Reading and writing the
//! file lives in [`crate::fs::progress`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::CoreResult;

use super::phase::Phase;
use super::task::{TaskId, TaskStatus, Transition};

/// Current on-disk format version.
pub const PROGRESS_FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    PROGRESS_FORMAT_VERSION
}

/// Per-task progress record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskProgress {
    pub status: TaskStatus,
    /// Present only while the task is failed.
    #[serde(default, alias = "message", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Fields written by other versions, carried through rewrites.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Snapshot of the whole migration's progress.
///
/// Tasks are keyed by their string id so that entries this build does not
/// know about survive a rewrite untouched, and unknown top-level fields are
/// kept in `extra` for the same reason. Missing tasks read as `pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Incremented by the store on every write.
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskProgress>,
    #[serde(default)]
    pub consecutive_failures: u32,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            version: PROGRESS_FORMAT_VERSION,
            revision: 0,
            tasks: BTreeMap::new(),
            consecutive_failures: 0,
            last_updated: None,
            extra: BTreeMap::new(),
        }
    }
}

impl ProgressState {
    pub fn status(&self, id: &TaskId) -> TaskStatus {
        self.entry(id).map(|p| p.status).unwrap_or_default()
    }

    pub fn entry(&self, id: &TaskId) -> Option<&TaskProgress> {
        self.tasks.get(&id.to_string())
    }

    pub fn error_message(&self, id: &TaskId) -> Option<&str> {
        self.entry(id).and_then(|p| p.error_message.as_deref())
    }

    /// Apply a transition to one task.
    ///
    /// Returns `Ok(false)` for accepted no-ops (completing a passed task,
    /// retrying a pending one); the state is left untouched in that case.
    /// On rejection nothing is modified.
    pub fn apply(
        &mut self,
        id: TaskId,
        transition: Transition,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<bool> {
        let current = self.status(&id);
        let next = current.try_apply(id, transition)?;
        if current.is_noop(transition) {
            return Ok(false);
        }

        let error_message = match next {
            TaskStatus::Failed => Some(message.unwrap_or_default()),
            _ => None,
        };

        match transition {
            Transition::Complete => self.consecutive_failures = 0,
            Transition::Fail => self.consecutive_failures += 1,
            _ => {}
        }

        let key = id.to_string();
        let extra = self
            .tasks
            .remove(&key)
            .map(|previous| previous.extra)
            .unwrap_or_default();
        self.tasks.insert(
            key,
            TaskProgress {
                status: next,
                error_message,
                timestamp: Some(now),
                extra,
            },
        );
        Ok(true)
    }

    /// Drop error messages from non-failed entries (older files stored a
    /// message for every status).
    pub fn normalize(&mut self) {
        for progress in self.tasks.values_mut() {
            if progress.status != TaskStatus::Failed {
                progress.error_message = None;
            }
        }
    }

    /// Tasks of `phase` that have not passed, in order.
    pub fn unfinished_in(&self, phase: &Phase) -> Vec<TaskId> {
        phase
            .tasks
            .iter()
            .filter(|id| self.status(id) != TaskStatus::Passed)
            .copied()
            .collect()
    }

    pub fn phase_passed(&self, phase: &Phase) -> bool {
        self.unfinished_in(phase).is_empty()
    }
}
