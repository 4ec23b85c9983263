//! Drive the built-in migration plan from start to finish through the
//! command layer, checkpointing whenever a completion reports one is due.

use serial_test::serial;
use std::collections::BTreeSet;

use shuttle::commands::{checkpoint, complete, next, start, Workspace};
use shuttle::commands::complete::Completion;
use shuttle::git::GitVcs;
use shuttle::models::TaskId;
use shuttle::scheduler::Directive;

use super::helpers::*;

#[test]
#[serial]
fn test_builtin_plan_runs_to_completion() {
    let temp_dir = init_test_repo();
    let repo_root = temp_dir.path();
    let ws = Workspace::open(repo_root).unwrap();
    let vcs = GitVcs::open(repo_root).unwrap();

    let mut finished: Vec<TaskId> = Vec::new();
    let mut checkpointed: Vec<u32> = Vec::new();
    let mut saw_parallel = false;

    for _ in 0..ws.catalog.len() + 1 {
        let directive = next::run(&ws, Some(&vcs)).unwrap();
        let batch = match directive {
            Directive::Complete => break,
            Directive::Parallel(ids) => {
                saw_parallel = true;
                for (i, a) in ids.iter().enumerate() {
                    for b in &ids[i + 1..] {
                        assert!(ws.graph.independent(a, b), "{a} and {b} are dependent");
                    }
                }
                ids
            }
            Directive::Sequential(id) => vec![id],
            other => panic!("unexpected directive {other}"),
        };

        for id in batch {
            start::run(&ws, &id.to_string()).unwrap();
            let completion = complete::run(&ws, &id.to_string(), None, None, Some(&vcs)).unwrap();
            if let Completion::Passed {
                phase_ready: Some(phase),
                ..
            } = completion
            {
                checkpoint::create(&ws, &vcs, phase, "phase done").unwrap();
                checkpointed.push(phase);
            }
            finished.push(id);
        }
    }

    assert_eq!(next::run(&ws, Some(&vcs)).unwrap(), Directive::Complete);
    assert!(saw_parallel);

    let unique: BTreeSet<TaskId> = finished.iter().copied().collect();
    assert_eq!(unique.len(), ws.catalog.len());

    // Every task started only after its dependencies finished
    for (pos, id) in finished.iter().enumerate() {
        let task = ws.catalog.get(id).unwrap();
        for dep in &task.dependencies {
            let dep_pos = finished.iter().position(|f| f == dep).unwrap();
            assert!(dep_pos < pos, "{id} ran before its dependency {dep}");
        }
    }

    // Checkpoints only ever move forward and end on the last phase
    assert!(checkpointed.windows(2).all(|w| w[0] < w[1]));
    let last_phase = ws.catalog.phases().map(|p| p.number).max();
    assert_eq!(checkpointed.last().copied(), last_phase);
    assert_eq!(
        tags(repo_root),
        checkpointed
            .iter()
            .map(|p| format!("checkpoint/flexplus/phase-{p}"))
            .collect::<Vec<_>>()
    );
}
