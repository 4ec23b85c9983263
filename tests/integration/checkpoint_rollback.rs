//! Checkpoint and rollback against a real git repository

use serial_test::serial;
use std::fs;

use shuttle::checkpoints::{CheckpointManager, RollbackManager};
use shuttle::error::OrchestratorError;
use shuttle::git::{GitVcs, VersionControl};
use shuttle::models::TaskStatus;

use super::helpers::*;

#[test]
#[serial]
fn test_checkpoint_tags_head() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let ws = small_workspace(repo_root);
    let vcs = GitVcs::open(repo_root).unwrap();
    pass(&ws, &["1.1", "1.2"]);

    let manager = CheckpointManager::new(&vcs, PROJECT);
    let checkpoint = manager
        .create(&ws.catalog, &ws.store.load().unwrap(), 1, "schema ready")
        .unwrap();

    assert_eq!(checkpoint.tag, "checkpoint/demo/phase-1");
    assert_eq!(checkpoint.commit, head(repo_root));
    assert_eq!(manager.list().unwrap(), vec![checkpoint]);
    assert!(!vcs.is_dirty().unwrap());
}

#[test]
#[serial]
fn test_checkpoint_commits_pending_changes() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let ws = small_workspace(repo_root);
    let vcs = GitVcs::open(repo_root).unwrap();
    pass(&ws, &["1.1", "1.2"]);
    fs::write(repo_root.join("schema.sql"), "CREATE TABLE usage ();\n").unwrap();
    let before = head(repo_root);

    let checkpoint = CheckpointManager::new(&vcs, PROJECT)
        .create(&ws.catalog, &ws.store.load().unwrap(), 1, "schema ready")
        .unwrap();

    assert_ne!(checkpoint.commit, before);
    assert_eq!(last_subject(repo_root), "checkpoint(phase-1): schema ready");
    assert!(!vcs.is_dirty().unwrap());
}

#[test]
#[serial]
fn test_checkpoint_rejected_before_phase_passes() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let ws = small_workspace(repo_root);
    let vcs = GitVcs::open(repo_root).unwrap();
    pass(&ws, &["1.1"]);

    let err = CheckpointManager::new(&vcs, PROJECT)
        .create(&ws.catalog, &ws.store.load().unwrap(), 1, "too early")
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<OrchestratorError>(),
        Some(OrchestratorError::NotAllTasksPassed { phase: 1, .. })
    ));
    assert!(tags(repo_root).is_empty());
}

#[test]
#[serial]
fn test_commits_since_lists_newest_first() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let ws = small_workspace(repo_root);
    let vcs = GitVcs::open(repo_root).unwrap();
    pass(&ws, &["1.1", "1.2"]);
    let manager = CheckpointManager::new(&vcs, PROJECT);
    let checkpoint = manager
        .create(&ws.catalog, &ws.store.load().unwrap(), 1, "schema")
        .unwrap();

    commit_file(repo_root, "api/usage.py", "def usage(): ...\n", "add usage endpoint");
    commit_file(repo_root, "api/tariff.py", "def tariff(): ...\n", "add tariff endpoint");

    let subjects: Vec<String> = manager
        .commits_since(&checkpoint)
        .unwrap()
        .into_iter()
        .map(|c| c.subject)
        .collect();
    assert_eq!(subjects, vec!["add tariff endpoint", "add usage endpoint"]);
}

/// Phase 1 checkpointed, a phase 2 task fails, rollback restores the phase 1
/// tree and resets phase 2 onwards.
#[test]
#[serial]
fn test_rollback_restores_tree_and_progress() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let ws = small_workspace(repo_root);
    let vcs = GitVcs::open(repo_root).unwrap();
    let checkpoints = CheckpointManager::new(&vcs, PROJECT);

    commit_file(repo_root, "schema.sql", "CREATE TABLE usage ();\n", "schema");
    pass(&ws, &["1.1", "1.2"]);
    let phase1 = checkpoints
        .create(&ws.catalog, &ws.store.load().unwrap(), 1, "schema")
        .unwrap();

    pass(&ws, &["2.1"]);
    commit_file(repo_root, "api/usage.py", "def usage(): ...\n", "usage endpoint");
    ws.store.mark_in_progress(id("2.2")).unwrap();
    ws.store.fail(id("2.2"), "tariff tests fail").unwrap();

    let rollback = RollbackManager::new(&checkpoints, &ws.catalog, &ws.store);
    let plan = rollback.plan(None).unwrap();
    assert_eq!(plan.target, phase1);
    assert_eq!(plan.failed_phase, Some(2));
    assert_eq!(plan.reset_tasks, vec![id("2.1"), id("2.2"), id("3.1")]);
    assert_eq!(plan.discarded_commits.len(), 1);

    let report = rollback.execute(&plan).unwrap();
    assert_eq!(report.reset_tasks, vec![id("2.1"), id("2.2")]);

    assert_eq!(head(repo_root), phase1.commit);
    assert!(repo_root.join("schema.sql").exists());
    assert!(!repo_root.join("api/usage.py").exists());

    let state = ws.store.load().unwrap();
    for done in ["1.1", "1.2"] {
        assert_eq!(state.status(&id(done)), TaskStatus::Passed);
    }
    for reset in ["2.1", "2.2", "3.1"] {
        assert_eq!(state.status(&id(reset)), TaskStatus::Pending);
    }
    assert_eq!(state.consecutive_failures, 0);
}

#[test]
#[serial]
fn test_rollback_to_earlier_phase_deletes_later_tags() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let ws = small_workspace(repo_root);
    let vcs = GitVcs::open(repo_root).unwrap();
    let checkpoints = CheckpointManager::new(&vcs, PROJECT);

    pass(&ws, &["1.1", "1.2"]);
    checkpoints
        .create(&ws.catalog, &ws.store.load().unwrap(), 1, "schema")
        .unwrap();
    commit_file(repo_root, "api/usage.py", "def usage(): ...\n", "api");
    pass(&ws, &["2.1", "2.2"]);
    checkpoints
        .create(&ws.catalog, &ws.store.load().unwrap(), 2, "api")
        .unwrap();

    let report = RollbackManager::new(&checkpoints, &ws.catalog, &ws.store)
        .rollback(Some(1))
        .unwrap();

    assert_eq!(report.deleted_tags, vec!["checkpoint/demo/phase-2".to_string()]);
    assert_eq!(tags(repo_root), vec!["checkpoint/demo/phase-1".to_string()]);

    // Phase 2 can be checkpointed again once redone
    pass(&ws, &["2.1", "2.2"]);
    checkpoints
        .create(&ws.catalog, &ws.store.load().unwrap(), 2, "api again")
        .unwrap();
}

#[test]
#[serial]
fn test_rollback_without_checkpoint_is_rejected() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let ws = small_workspace(repo_root);
    let vcs = GitVcs::open(repo_root).unwrap();
    ws.store.mark_in_progress(id("1.1")).unwrap();
    ws.store.fail(id("1.1"), "boom").unwrap();
    let before = ws.store.load().unwrap();
    let head_before = head(repo_root);

    let checkpoints = CheckpointManager::new(&vcs, PROJECT);
    let err = RollbackManager::new(&checkpoints, &ws.catalog, &ws.store)
        .rollback(None)
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<OrchestratorError>(),
        Some(&OrchestratorError::NoCheckpoint { before_phase: 1 })
    );
    assert_eq!(ws.store.load().unwrap(), before);
    assert_eq!(head(repo_root), head_before);
}
