//! Run the compiled binary and check its stdout protocol and exit codes

use serial_test::serial;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::thread;
use tempfile::TempDir;

use shuttle::fs::ProgressStore;
use shuttle::models::TaskStatus;

use super::helpers::*;

fn shuttle(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_shuttle"))
        .args(args)
        .arg("--project-dir")
        .arg(project)
        .env_remove("SHUTTLE_PROJECT_DIR")
        .env_remove("CLAUDE_PROJECT_DIR")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run shuttle")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
#[serial]
fn test_next_on_fresh_project() {
    let temp = TempDir::new().unwrap();
    let output = shuttle(temp.path(), &["next"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "PARALLEL:1.1 1.2");
}

#[test]
#[serial]
fn test_start_complete_fail_protocol() {
    let temp = TempDir::new().unwrap();
    let project = temp.path();

    assert_eq!(stdout(&shuttle(project, &["start", "1.1"])), "OK");
    assert_eq!(stdout(&shuttle(project, &["complete", "1.1"])), "OK");
    // Completing twice is a no-op
    assert_eq!(stdout(&shuttle(project, &["complete", "1.1"])), "OK");

    assert_eq!(stdout(&shuttle(project, &["start", "1.2"])), "OK");
    let failed = shuttle(project, &["fail", "1.2", "missing", "column"]);
    assert!(failed.status.success());
    assert_eq!(stdout(&failed), "FAILED:1/3");

    let store = ProgressStore::for_project(project);
    let state = store.load().unwrap();
    assert_eq!(state.status(&id("1.1")), TaskStatus::Passed);
    assert_eq!(state.error_message(&id("1.2")), Some("missing column"));

    // The failure blocks 1.3, but independent work is still handed out
    assert_eq!(stdout(&shuttle(project, &["next"])), "PARALLEL:4.1 4.2 4.3");
}

#[test]
#[serial]
fn test_invalid_transition_exits_nonzero() {
    let temp = TempDir::new().unwrap();
    let output = shuttle(temp.path(), &["fail", "1.1", "boom"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid transition for task 1.1"));
    assert!(!temp.path().join(".work/state/progress.json").exists());
}

#[test]
#[serial]
fn test_unknown_task_exits_nonzero() {
    let temp = TempDir::new().unwrap();
    let output = shuttle(temp.path(), &["details", "7.7"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown task: 7.7"));
}

#[test]
#[serial]
fn test_validate_bash_reads_stdin_and_blocks() {
    let temp = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_shuttle"))
        .args(["validate", "bash", "--project-dir"])
        .arg(temp.path())
        .env("NO_COLOR", "1")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn shuttle");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"git push --force origin main\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("force-pushes to main"));
}

#[test]
#[serial]
fn test_validate_safe_command_passes() {
    let temp = TempDir::new().unwrap();
    let output = shuttle(temp.path(), &["validate", "bash", "ls -la"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("no issues"));
}

#[test]
#[serial]
fn test_concurrent_processes_do_not_lose_updates() {
    let temp = TempDir::new().unwrap();
    let project = temp.path().to_path_buf();
    let ready = ["1.1", "1.2", "2.1", "3.1", "4.1", "4.2", "4.3"];

    let handles: Vec<_> = ready
        .iter()
        .map(|task| {
            let project = project.clone();
            let task = task.to_string();
            thread::spawn(move || shuttle(&project, &["start", &task]))
        })
        .collect();
    for handle in handles {
        let output = handle.join().unwrap();
        assert!(output.status.success(), "{}", stderr(&output));
    }

    let state = ProgressStore::for_project(&project).load().unwrap();
    for task in ready {
        assert_eq!(state.status(&id(task)), TaskStatus::InProgress, "{task}");
    }
    assert_eq!(state.revision, ready.len() as u64);
}

#[test]
#[serial]
fn test_checkpoint_and_rollback_through_cli() {
    let temp_dir = init_test_repo();
    let repo = temp_dir.path();

    for task in ["1.1", "1.2"] {
        shuttle(repo, &["start", task]);
        shuttle(repo, &["complete", task]);
    }
    shuttle(repo, &["start", "1.3"]);
    assert_eq!(stdout(&shuttle(repo, &["complete", "1.3"])), "OK");
    shuttle(repo, &["start", "1.4"]);
    assert_eq!(stdout(&shuttle(repo, &["complete", "1.4"])), "CHECKPOINT:1");

    let created = shuttle(repo, &["checkpoint", "1", "schema", "ready"]);
    assert!(created.status.success(), "{}", stderr(&created));
    assert_eq!(stdout(&created), "Checkpoint: checkpoint/flexplus/phase-1");

    let listed = shuttle(repo, &["checkpoint", "--list"]);
    assert!(stdout(&listed).contains("checkpoint/flexplus/phase-1"));

    commit_file(repo, "apps/energy-api/usage.py", "def usage(): ...\n", "usage wip");
    shuttle(repo, &["start", "2.1"]);
    shuttle(repo, &["fail", "2.1", "import error"]);

    // Unconfirmed rollback prints the plan and changes nothing
    let dry = shuttle(repo, &["rollback"]);
    assert_eq!(dry.status.code(), Some(1));
    assert!(stdout(&dry).contains("usage wip"));
    assert!(repo.join("apps/energy-api/usage.py").exists());

    let done = shuttle(repo, &["rollback", "--yes"]);
    assert!(done.status.success(), "{}", stderr(&done));
    assert!(stdout(&done).contains("Rolled back to checkpoint/flexplus/phase-1"));
    assert!(!repo.join("apps/energy-api/usage.py").exists());

    let state = ProgressStore::for_project(repo).load().unwrap();
    assert_eq!(state.status(&id("2.1")), TaskStatus::Pending);
    assert_eq!(state.status(&id("1.4")), TaskStatus::Passed);
}

#[test]
#[serial]
fn test_reset_all_needs_yes() {
    let temp = TempDir::new().unwrap();
    shuttle(temp.path(), &["start", "1.1"]);

    let refused = shuttle(temp.path(), &["reset", "--all"]);
    assert_eq!(refused.status.code(), Some(1));
    assert!(temp.path().join(".work/state/progress.json").exists());

    let done = shuttle(temp.path(), &["reset", "--all", "--yes"]);
    assert!(done.status.success());
    assert!(!temp.path().join(".work/state/progress.json").exists());
}
