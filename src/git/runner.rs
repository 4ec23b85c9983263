//! Thin wrappers around the `git` binary
//!
//! Every git invocation in the crate goes through here so that working
//! directory, prompts and error context are handled the same way.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

fn git(repo_root: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(repo_root)
        .env("GIT_TERMINAL_PROMPT", "0");
    cmd
}

/// Run a git command and return the raw output, whatever its exit status.
pub fn run_git(repo_root: &Path, args: &[&str]) -> Result<Output> {
    debug!(repo = %repo_root.display(), "git {}", args.join(" "));
    git(repo_root, args)
        .output()
        .with_context(|| format!("Failed to execute: git {}", args.join(" ")))
}

/// Run a git command that must succeed; returns trimmed stdout.
///
/// On a non-zero exit the error carries the full command line and stderr.
pub fn run_git_checked(repo_root: &Path, args: &[&str]) -> Result<String> {
    let output = run_git(repo_root, args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// True if the command ran and exited 0. Spawn failures count as false.
pub fn run_git_bool(repo_root: &Path, args: &[&str]) -> bool {
    run_git(repo_root, args)
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Fail unless `repo_root` is inside a git work tree.
pub fn ensure_repository(repo_root: &Path) -> Result<()> {
    if !run_git_bool(repo_root, &["rev-parse", "--is-inside-work-tree"]) {
        bail!("Not a git repository: {}", repo_root.display());
    }
    Ok(())
}
