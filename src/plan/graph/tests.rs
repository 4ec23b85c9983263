//! Tests for the dependency graph

use super::*;
use crate::error::OrchestratorError;
use chrono::Utc;

use crate::models::Transition;

fn id(s: &str) -> TaskId {
    s.parse().unwrap()
}

fn node(task: &str, deps: &[&str], group: Option<&str>) -> TaskNode {
    let task = id(task);
    TaskNode {
        id: task,
        phase: task.phase(),
        dependencies: deps.iter().map(|d| id(d)).collect(),
        parallel_group: group.map(String::from),
    }
}

fn graph(nodes: Vec<TaskNode>) -> DependencyGraph {
    DependencyGraph::from_nodes(nodes)
}

fn pass(state: &mut ProgressState, task: &str) {
    let now = Utc::now();
    state.apply(id(task), Transition::Start, None, now).unwrap();
    state.apply(id(task), Transition::Complete, None, now).unwrap();
}

fn fail(state: &mut ProgressState, task: &str) {
    let now = Utc::now();
    state.apply(id(task), Transition::Start, None, now).unwrap();
    state
        .apply(id(task), Transition::Fail, Some("broken".into()), now)
        .unwrap();
}

#[test]
fn test_chain_ready_set_advances() {
    let g = graph(vec![
        node("1.1", &[], None),
        node("1.2", &["1.1"], None),
        node("1.3", &["1.2"], None),
    ]);
    g.validate().unwrap();

    let mut state = ProgressState::default();
    assert_eq!(g.ready_set(&state), vec![id("1.1")]);

    pass(&mut state, "1.1");
    assert_eq!(g.ready_set(&state), vec![id("1.2")]);

    pass(&mut state, "1.2");
    assert_eq!(g.ready_set(&state), vec![id("1.3")]);
}

#[test]
fn test_diamond_waits_for_both_parents() {
    let g = graph(vec![
        node("1.1", &[], None),
        node("1.2", &["1.1"], None),
        node("1.3", &["1.1"], None),
        node("1.4", &["1.2", "1.3"], None),
    ]);

    let mut state = ProgressState::default();
    pass(&mut state, "1.1");
    assert_eq!(g.ready_set(&state), vec![id("1.2"), id("1.3")]);

    pass(&mut state, "1.2");
    assert_eq!(g.ready_set(&state), vec![id("1.3")]);

    pass(&mut state, "1.3");
    assert_eq!(g.ready_set(&state), vec![id("1.4")]);
}

#[test]
fn test_disjoint_branches_are_independent() {
    let g = graph(vec![
        node("1.1", &[], None),
        node("1.2", &["1.1"], None),
        node("2.1", &[], None),
        node("2.2", &["2.1"], None),
    ]);

    assert!(g.independent(&id("1.2"), &id("2.2")));
    assert!(!g.independent(&id("1.1"), &id("1.2")));
    assert!(!g.independent(&id("1.1"), &id("1.1")));
    assert_eq!(g.ready_set(&ProgressState::default()), vec![id("1.1"), id("2.1")]);
}

#[test]
fn test_ready_set_excludes_non_pending() {
    let g = graph(vec![node("1.1", &[], None), node("1.2", &[], None)]);
    let mut state = ProgressState::default();
    state
        .apply(id("1.1"), Transition::Start, None, Utc::now())
        .unwrap();
    fail(&mut state, "1.2");

    assert!(g.ready_set(&state).is_empty());
}

#[test]
fn test_transitive_ancestors() {
    let g = graph(vec![
        node("1.1", &[], None),
        node("1.2", &["1.1"], None),
        node("2.1", &["1.2"], None),
    ]);

    let ancestors = g.ancestors(&id("2.1"));
    assert!(ancestors.contains(&id("1.1")));
    assert!(ancestors.contains(&id("1.2")));
    assert!(g.depends_on(&id("2.1"), &id("1.1")));
    assert!(!g.depends_on(&id("1.1"), &id("2.1")));
}

#[test]
fn test_detect_cycle() {
    let g = graph(vec![
        node("1.1", &["1.3"], None),
        node("1.2", &["1.1"], None),
        node("1.3", &["1.2"], None),
    ]);

    let err = g.validate().unwrap_err();
    assert!(matches!(err, OrchestratorError::Cycle { .. }));
    assert!(err.to_string().contains("Circular"));
}

#[test]
fn test_detect_self_loop() {
    let g = graph(vec![node("1.1", &["1.1"], None)]);
    let err = g.validate().unwrap_err();
    match err {
        OrchestratorError::Cycle { path } => assert_eq!(path, vec!["1.1", "1.1"]),
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn test_acyclic_validates() {
    let g = graph(vec![
        node("1.1", &[], None),
        node("1.2", &["1.1"], None),
        node("1.3", &["1.1", "1.2"], None),
    ]);
    assert!(g.validate().is_ok());
}

#[test]
fn test_topological_sort_respects_dependencies() {
    let g = graph(vec![
        node("1.1", &[], None),
        node("1.2", &[], None),
        node("2.1", &["1.2"], None),
        node("2.2", &["1.1", "2.1"], None),
    ]);

    let order = g.topological_sort().unwrap();
    let pos = |s: &str| order.iter().position(|t| *t == id(s)).unwrap();
    assert_eq!(order.len(), 4);
    assert!(pos("1.2") < pos("2.1"));
    assert!(pos("2.1") < pos("2.2"));
    assert!(pos("1.1") < pos("2.2"));
}

#[test]
fn test_topological_sort_reports_cycle() {
    let g = graph(vec![node("1.1", &["1.2"], None), node("1.2", &["1.1"], None)]);
    assert!(g.topological_sort().is_err());
}

#[test]
fn test_blocked_when_failure_starves_successor() {
    let g = graph(vec![
        node("1.1", &[], Some("schema")),
        node("1.2", &[], Some("schema")),
        node("1.3", &["1.1", "1.2"], None),
    ]);

    let mut state = ProgressState::default();
    fail(&mut state, "1.1");
    pass(&mut state, "1.2");

    assert!(g.is_blocked(&state));
    assert_eq!(g.blocking_failures(&state), vec![id("1.1")]);
}

#[test]
fn test_not_blocked_while_independent_task_ready() {
    let g = graph(vec![
        node("1.1", &[], None),
        node("1.2", &[], None),
        node("1.3", &["1.1"], None),
    ]);

    let mut state = ProgressState::default();
    fail(&mut state, "1.1");

    assert_eq!(g.ready_set(&state), vec![id("1.2")]);
    assert!(!g.is_blocked(&state));
}

#[test]
fn test_not_blocked_while_task_in_progress() {
    let g = graph(vec![node("1.1", &[], None), node("1.2", &["1.1"], None)]);
    let mut state = ProgressState::default();
    state
        .apply(id("1.1"), Transition::Start, None, Utc::now())
        .unwrap();

    assert!(g.ready_set(&state).is_empty());
    assert!(!g.is_blocked(&state));
}

#[test]
fn test_parallel_group_members_in_order() {
    let g = graph(vec![
        node("4.3", &[], Some("constants")),
        node("4.1", &[], Some("constants")),
        node("4.2", &[], Some("constants")),
    ]);

    assert_eq!(
        g.parallel_group("constants"),
        &[id("4.1"), id("4.2"), id("4.3")]
    );
    assert!(g.parallel_group("missing").is_empty());
}

#[test]
fn test_builtin_catalog_graph() {
    let catalog = TaskCatalog::builtin().unwrap();
    let g = DependencyGraph::build_validated(&catalog).unwrap();

    assert_eq!(g.len(), 18);
    assert_eq!(g.parallel_group("schema"), &[id("1.1"), id("1.2")]);
    assert_eq!(g.dependents(&id("2.1")), &[id("2.2"), id("2.3")]);
    assert_eq!(
        g.ready_set(&ProgressState::default()),
        vec![
            id("1.1"),
            id("1.2"),
            id("2.1"),
            id("3.1"),
            id("4.1"),
            id("4.2"),
            id("4.3")
        ]
    );
}
