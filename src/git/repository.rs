//! [`VersionControl`] backed by the `git` command line

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use super::runner::{run_git_bool, run_git_checked};
use super::vcs::{CommitSummary, TagRef, VersionControl};

#[derive(Debug, Clone)]
pub struct GitVcs {
    repo_root: PathBuf,
}

impl GitVcs {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Open `repo_root`, failing if it is not a git work tree.
    pub fn open(repo_root: impl Into<PathBuf>) -> Result<Self> {
        let vcs = Self::new(repo_root);
        super::runner::ensure_repository(&vcs.repo_root)?;
        Ok(vcs)
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        run_git_checked(&self.repo_root, args)
    }
}

impl VersionControl for GitVcs {
    fn head_commit(&self) -> Result<String> {
        self.git(&["rev-parse", "HEAD"])
            .context("Failed to resolve HEAD; does the repository have a commit?")
    }

    fn is_dirty(&self) -> Result<bool> {
        let status = self.git(&["status", "--porcelain"])?;
        Ok(!status.is_empty())
    }

    fn commit_all(&self, message: &str) -> Result<String> {
        self.git(&["add", "-A"])?;
        self.git(&["commit", "-m", message])?;
        self.head_commit()
    }

    fn create_tag(&self, name: &str, commit: &str, message: &str) -> Result<()> {
        // Annotated tags need a non-empty message
        let message = if message.trim().is_empty() { name } else { message };
        self.git(&["tag", "-a", name, "-m", message, commit])
            .with_context(|| format!("Failed to create tag {name}"))?;
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        self.git(&["tag", "-d", name])
            .with_context(|| format!("Failed to delete tag {name}"))?;
        Ok(())
    }

    fn list_tags(&self, prefix: &str) -> Result<Vec<TagRef>> {
        let pattern = format!("refs/tags/{prefix}");
        let output = self.git(&[
            "for-each-ref",
            "--sort=refname",
            "--format=%(refname:strip=2)%09%(objectname)%09%(*objectname)",
            &pattern,
        ])?;
        Ok(parse_tag_refs(&output, prefix))
    }

    fn commits_between(&self, from: &str, to: &str) -> Result<Vec<CommitSummary>> {
        let range = format!("{from}..{to}");
        let output = self.git(&["log", "--format=%H%x09%s", &range])?;
        Ok(output
            .lines()
            .filter_map(|line| {
                let (id, subject) = line.split_once('\t')?;
                Some(CommitSummary {
                    id: id.to_string(),
                    subject: subject.to_string(),
                })
            })
            .collect())
    }

    fn reset_to(&self, commit: &str) -> Result<()> {
        if !run_git_bool(&self.repo_root, &["cat-file", "-e", &format!("{commit}^{{commit}}")]) {
            bail!("Unknown commit: {commit}");
        }
        self.git(&["reset", "--hard", commit])?;
        Ok(())
    }
}

/// Parse `for-each-ref` lines of `name\tobject\tpeeled`.
///
/// Annotated tags report the tagged commit in the peeled column; lightweight
/// tags leave it empty and point at the commit directly.
fn parse_tag_refs(output: &str, prefix: &str) -> Vec<TagRef> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split('\t');
            let name = fields.next()?.trim();
            let object = fields.next()?.trim();
            let peeled = fields.next().unwrap_or("").trim();
            if name.is_empty() || !name.starts_with(prefix) {
                return None;
            }
            let commit = if peeled.is_empty() { object } else { peeled };
            Some(TagRef {
                name: name.to_string(),
                commit: commit.to_string(),
            })
        })
        .collect()
}
