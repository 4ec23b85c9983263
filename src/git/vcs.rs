//! Version-control adapter consumed by the checkpoint and rollback managers

use anyhow::Result;

/// A tag and the commit it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    pub name: String,
    pub commit: String,
}

/// One line of history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    pub id: String,
    pub subject: String,
}

/// The narrow set of operations the orchestrator needs from version control.
///
/// Implemented for real repositories by [`super::GitVcs`] and in memory by
/// [`super::InMemoryVcs`] for tests.
pub trait VersionControl {
    /// Commit id at HEAD.
    fn head_commit(&self) -> Result<String>;

    /// True if the working tree has uncommitted changes, untracked files included.
    fn is_dirty(&self) -> Result<bool>;

    /// Stage everything and commit; returns the new HEAD.
    fn commit_all(&self, message: &str) -> Result<String>;

    /// Create an annotated tag at `commit`. Fails if the tag exists.
    fn create_tag(&self, name: &str, commit: &str, message: &str) -> Result<()>;

    fn delete_tag(&self, name: &str) -> Result<()>;

    /// Tags whose name starts with `prefix`, sorted by name.
    fn list_tags(&self, prefix: &str) -> Result<Vec<TagRef>>;

    /// Commits reachable from `to` but not from `from`, newest first.
    fn commits_between(&self, from: &str, to: &str) -> Result<Vec<CommitSummary>>;

    /// Hard-reset HEAD, index and working tree to `commit`.
    fn reset_to(&self, commit: &str) -> Result<()>;
}
