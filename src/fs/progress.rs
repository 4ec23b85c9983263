//! Progress store: durable, atomic persistence of [`ProgressState`]
//!
//! The state lives in a single JSON document (by default
//! `.work/state/progress.json`). Every mutation is one read-modify-write
//! performed under an exclusive lock and committed by atomic rename.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::models::{ProgressState, TaskId, Transition, PROGRESS_FORMAT_VERSION};

use super::locking::{atomic_write, lock_path_for, read_if_exists, ExclusiveLock};

/// Default location of the progress file relative to the project root.
pub const DEFAULT_PROGRESS_PATH: &str = ".work/state/progress.json";

/// Outcome of a `fail` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureRecord {
    /// Consecutive failures after this one.
    pub consecutive_failures: u32,
}

#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        Self { path, lock_path }
    }

    /// Store at the default location under `project_root`.
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(DEFAULT_PROGRESS_PATH))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current snapshot. A missing file reads as a fresh state.
    pub fn load(&self) -> Result<ProgressState> {
        let Some(content) = read_if_exists(&self.path)? else {
            debug!(path = %self.path.display(), "no progress file, starting fresh");
            return Ok(ProgressState::default());
        };

        let mut state: ProgressState = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse progress file: {}", self.path.display()))?;

        if state.version > PROGRESS_FORMAT_VERSION {
            warn!(
                path = %self.path.display(),
                found = state.version,
                supported = PROGRESS_FORMAT_VERSION,
                "progress file was written by a newer version; unknown fields are kept as-is"
            );
        }
        state.normalize();
        Ok(state)
    }

    /// Run `mutate` against the current state as one atomic transaction.
    ///
    /// The state is written back only if `mutate` succeeds and changed
    /// something; the revision counter and `last_updated` are bumped on write.
    /// An error from `mutate` leaves the file untouched.
    pub fn update<T>(&self, mutate: impl FnOnce(&mut ProgressState) -> Result<T>) -> Result<T> {
        let _lock = ExclusiveLock::acquire(&self.lock_path)?;

        let mut state = self.load()?;
        let before = state.clone();
        let out = mutate(&mut state)?;

        if state != before {
            state.version = state.version.max(PROGRESS_FORMAT_VERSION);
            state.revision = before.revision + 1;
            state.last_updated = Some(Utc::now());
            self.write(&state)?;
            debug!(revision = state.revision, "progress saved");
        }

        Ok(out)
    }

    fn write(&self, state: &ProgressState) -> Result<()> {
        let json =
            serde_json::to_string_pretty(state).context("Failed to serialize progress state")?;
        atomic_write(&self.path, &json)
    }

    /// `pending -> in_progress`.
    pub fn mark_in_progress(&self, id: TaskId) -> Result<()> {
        self.transition(id, Transition::Start, None).map(|_| ())
    }

    /// `in_progress -> passed`. Returns `false` if the task had already passed.
    pub fn complete(&self, id: TaskId) -> Result<bool> {
        self.complete_and(id, |_, _| ()).map(|(changed, _)| changed)
    }

    /// [`complete`](Self::complete), also handing the states before and after
    /// the transition to `judge` while the lock is still held.
    pub fn complete_and<T>(
        &self,
        id: TaskId,
        judge: impl FnOnce(&ProgressState, &ProgressState) -> T,
    ) -> Result<(bool, T)> {
        let (changed, verdict) = self.update(|state| {
            let before = state.clone();
            let changed = state.apply(id, Transition::Complete, None, Utc::now())?;
            Ok((changed, judge(&before, state)))
        })?;
        if changed {
            info!(task = %id, "task passed");
        }
        Ok((changed, verdict))
    }

    /// `in_progress -> failed`, recording `message`.
    pub fn fail(&self, id: TaskId, message: &str) -> Result<FailureRecord> {
        self.update(|state| {
            state.apply(id, Transition::Fail, Some(message.to_string()), Utc::now())?;
            Ok(FailureRecord {
                consecutive_failures: state.consecutive_failures,
            })
        })
        .inspect(|record| {
            warn!(task = %id, consecutive = record.consecutive_failures, "task failed: {message}");
        })
    }

    /// Manual retry: `failed -> pending`. Returns `false` if already pending.
    pub fn reset(&self, id: TaskId) -> Result<bool> {
        self.transition(id, Transition::Retry, None)
    }

    /// Reset every listed task to `pending` regardless of status and clear the
    /// failure counter, in a single write. Returns the ids that changed.
    pub fn reset_for_rollback(&self, ids: &[TaskId]) -> Result<Vec<TaskId>> {
        self.update(|state| {
            let now = Utc::now();
            let mut changed = Vec::new();
            for id in ids {
                if state.apply(*id, Transition::Rollback, None, now)? {
                    changed.push(*id);
                }
            }
            state.consecutive_failures = 0;
            Ok(changed)
        })
    }

    /// Discard all progress by deleting the state file.
    pub fn reset_all(&self) -> Result<bool> {
        let _lock = ExclusiveLock::acquire(&self.lock_path)?;
        if !self.path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .with_context(|| format!("Failed to delete progress file: {}", self.path.display()))?;
        info!(path = %self.path.display(), "progress reset");
        Ok(true)
    }

    fn transition(&self, id: TaskId, transition: Transition, message: Option<String>) -> Result<bool> {
        self.update(|state| Ok(state.apply(id, transition, message, Utc::now())?))
    }
}
