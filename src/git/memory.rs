//! In-memory [`VersionControl`] for exercising checkpoint and rollback logic
//! without a real repository

use anyhow::{bail, Result};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::vcs::{CommitSummary, TagRef, VersionControl};

#[derive(Debug, Default)]
struct Inner {
    /// Linear history from the root commit to HEAD
    history: Vec<CommitSummary>,
    /// Every commit ever made, so resets can move forward again
    all: Vec<CommitSummary>,
    tags: BTreeMap<String, String>,
    dirty: bool,
    resets: Vec<String>,
}

impl Inner {
    fn commit(&mut self, subject: &str) -> String {
        let id = format!("c{:04}", self.all.len());
        let summary = CommitSummary {
            id: id.clone(),
            subject: subject.to_string(),
        };
        self.history.push(summary.clone());
        self.all.push(summary);
        self.dirty = false;
        id
    }

    fn head(&self) -> Result<String> {
        match self.history.last() {
            Some(c) => Ok(c.id.clone()),
            None => bail!("repository has no commits"),
        }
    }
}

/// Linear-history fake of a repository.
///
/// Commit ids are `c0000`, `c0001`, … in creation order.
#[derive(Debug)]
pub struct InMemoryVcs {
    inner: Mutex<Inner>,
}

impl Default for InMemoryVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryVcs {
    /// A repository holding a single root commit.
    pub fn new() -> Self {
        let mut inner = Inner::default();
        inner.commit("initial commit");
        Self {
            inner: Mutex::new(inner),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record a commit made by someone working on a task.
    pub fn simulate_commit(&self, subject: &str) -> String {
        self.lock().commit(subject)
    }

    /// Mark the working tree as having uncommitted changes.
    pub fn simulate_edit(&self) {
        self.lock().dirty = true;
    }

    /// Commits passed to `reset_to`, in call order.
    pub fn resets(&self) -> Vec<String> {
        self.lock().resets.clone()
    }

    pub fn tag_names(&self) -> Vec<String> {
        self.lock().tags.keys().cloned().collect()
    }
}

impl VersionControl for InMemoryVcs {
    fn head_commit(&self) -> Result<String> {
        self.lock().head()
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.lock().dirty)
    }

    fn commit_all(&self, message: &str) -> Result<String> {
        Ok(self.lock().commit(message))
    }

    fn create_tag(&self, name: &str, commit: &str, _message: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.tags.contains_key(name) {
            bail!("tag '{name}' already exists");
        }
        if !inner.all.iter().any(|c| c.id == commit) {
            bail!("Unknown commit: {commit}");
        }
        inner.tags.insert(name.to_string(), commit.to_string());
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        if self.lock().tags.remove(name).is_none() {
            bail!("tag '{name}' not found");
        }
        Ok(())
    }

    fn list_tags(&self, prefix: &str) -> Result<Vec<TagRef>> {
        Ok(self
            .lock()
            .tags
            .iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .map(|(name, commit)| TagRef {
                name: name.clone(),
                commit: commit.clone(),
            })
            .collect())
    }

    fn commits_between(&self, from: &str, to: &str) -> Result<Vec<CommitSummary>> {
        let inner = self.lock();
        let position = |id: &str| inner.history.iter().position(|c| c.id == id);
        let Some(end) = position(to) else {
            bail!("Unknown commit: {to}");
        };
        let start = position(from).map(|i| i + 1).unwrap_or(0);
        if start > end {
            return Ok(Vec::new());
        }
        Ok(inner.history[start..=end].iter().rev().cloned().collect())
    }

    fn reset_to(&self, commit: &str) -> Result<()> {
        let mut inner = self.lock();
        let Some(index) = inner.all.iter().position(|c| c.id == commit) else {
            bail!("Unknown commit: {commit}");
        };

        // Rebuild the line of history ending at `commit`
        match inner.history.iter().position(|c| c.id == commit) {
            Some(pos) => inner.history.truncate(pos + 1),
            None => {
                let target = inner.all[index].clone();
                inner.history.push(target);
            }
        }
        inner.dirty = false;
        inner.resets.push(commit.to_string());
        Ok(())
    }
}
