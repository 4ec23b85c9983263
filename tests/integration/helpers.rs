//! Shared test helpers: temporary repositories and a small task catalog

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use shuttle::commands::Workspace;
use shuttle::config::Config;
use shuttle::models::{Phase, Task, TaskId};
use shuttle::plan::TaskCatalog;

pub const PROJECT: &str = "demo";

pub fn id(s: &str) -> TaskId {
    s.parse().expect("valid task id")
}

fn git(repo_root: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run git {}: {e}", args.join(" ")));
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Temporary git repository with one commit. `.work/` is ignored so progress
/// files never show up as uncommitted changes.
pub fn init_test_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let repo_root = temp_dir.path();

    git(repo_root, &["init"]);
    git(repo_root, &["config", "user.email", "test@test.com"]);
    git(repo_root, &["config", "user.name", "Test User"]);
    git(repo_root, &["config", "commit.gpgsign", "false"]);
    git(repo_root, &["config", "tag.gpgsign", "false"]);

    fs::write(repo_root.join("README.md"), "# Test Repository\n").expect("write README.md");
    fs::write(repo_root.join(".gitignore"), ".work/\n").expect("write .gitignore");
    git(repo_root, &["add", "."]);
    git(repo_root, &["commit", "-m", "Initial commit"]);

    temp_dir
}

/// Write `content` to `path` in the repo and commit it.
pub fn commit_file(repo_root: &Path, path: &str, content: &str, message: &str) -> String {
    let full = repo_root.join(path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(&full, content).expect("write file");
    git(repo_root, &["add", "-A"]);
    git(repo_root, &["commit", "-m", message]);
    head(repo_root)
}

pub fn head(repo_root: &Path) -> String {
    git(repo_root, &["rev-parse", "HEAD"])
}

pub fn last_subject(repo_root: &Path) -> String {
    git(repo_root, &["log", "-1", "--format=%s"])
}

pub fn tags(repo_root: &Path) -> Vec<String> {
    git(repo_root, &["tag", "--list"])
        .lines()
        .map(String::from)
        .collect()
}

/// Three phases: 1.1, 1.2 (group "schema") -> 2.1 -> 2.2 -> 3.1
pub fn small_catalog() -> TaskCatalog {
    let phases = vec![
        Phase::new(1, "Schema"),
        Phase::new(2, "Api"),
        Phase::new(3, "Integration"),
    ];
    let tasks = vec![
        Task::new(id("1.1"), "Create tables").with_parallel_group("schema"),
        Task::new(id("1.2"), "Create views").with_parallel_group("schema"),
        Task::new(id("2.1"), "Usage endpoint").with_dependencies([id("1.1"), id("1.2")]),
        Task::new(id("2.2"), "Tariff endpoint").with_dependencies([id("2.1")]),
        Task::new(id("3.1"), "End to end").with_dependencies([id("2.2")]),
    ];
    TaskCatalog::new(phases, tasks).expect("valid catalog")
}

pub fn small_workspace(repo_root: &Path) -> Workspace {
    let mut config = Config::default();
    config.project.name = PROJECT.to_string();
    Workspace::from_parts(repo_root.to_path_buf(), config, small_catalog())
        .expect("workspace opens")
}

/// Start and complete each task in order.
pub fn pass(ws: &Workspace, ids: &[&str]) {
    for raw in ids {
        ws.store.mark_in_progress(id(raw)).expect("start");
        ws.store.complete(id(raw)).expect("complete");
    }
}
