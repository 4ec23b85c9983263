//! Scheduler: decides what should happen next
//!
//! `next` is a pure function of the dependency graph, a progress snapshot and
//! the set of phases that already have a checkpoint. It never mutates state,
//! so calling it repeatedly with the same inputs returns the same directive.

mod directive;


use std::collections::BTreeSet;

use crate::models::{ProgressState, TaskId, TaskStatus};
use crate::plan::DependencyGraph;

pub use directive::Directive;

/// Default retry budget before rollback is suggested.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerPolicy {
    /// Consecutive `fail` calls (no `complete` in between) after which
    /// `RollbackNeeded` is surfaced.
    pub max_consecutive_failures: u32,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

pub struct Scheduler<'a> {
    graph: &'a DependencyGraph,
    policy: SchedulerPolicy,
}

impl<'a> Scheduler<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self::with_policy(graph, SchedulerPolicy::default())
    }

    pub fn with_policy(graph: &'a DependencyGraph, policy: SchedulerPolicy) -> Self {
        Self { graph, policy }
    }

    /// Decide the next directive.
    ///
    /// Checks run in a fixed order: complete, rollback needed, parallel or
    /// sequential work, then blocked or waiting when nothing is ready.
    pub fn next(&self, progress: &ProgressState, checkpointed: &BTreeSet<u32>) -> Directive {
        if self.graph.all_passed(progress) {
            return Directive::Complete;
        }

        if let Some(phase) = self.rollback_phase(progress, checkpointed) {
            return Directive::RollbackNeeded(phase);
        }

        let ready = self.graph.ready_set(progress);
        if let Some(group) = self.select_parallel(&ready) {
            return Directive::Parallel(group);
        }
        if let Some(first) = ready.first() {
            return Directive::Sequential(*first);
        }

        let running: Vec<TaskId> = self
            .graph
            .with_status(progress, TaskStatus::InProgress)
            .collect();
        if !running.is_empty() {
            return Directive::Waiting(running);
        }

        if self.graph.is_blocked(progress) {
            return Directive::Blocked(self.graph.blocking_failures(progress));
        }

        // No pending work left at all: the failed leaves themselves are what
        // stands between here and completion
        Directive::Blocked(self.graph.with_status(progress, TaskStatus::Failed).collect())
    }

    /// Phase of the earliest failed task, when that failure calls for a
    /// rollback rather than another retry.
    ///
    /// That is the case when the failed task belongs to a phase that was
    /// already checkpointed, or when the retry budget is spent.
    fn rollback_phase(&self, progress: &ProgressState, checkpointed: &BTreeSet<u32>) -> Option<u32> {
        let failed: Vec<TaskId> = self
            .graph
            .with_status(progress, TaskStatus::Failed)
            .collect();
        let earliest = failed.first()?;

        let in_checkpointed_phase = failed.iter().any(|id| checkpointed.contains(&id.phase()));
        let budget_spent = progress.consecutive_failures >= self.policy.max_consecutive_failures;

        (in_checkpointed_phase || budget_spent).then_some(earliest.phase())
    }

    /// Pick the parallel group to hand out, if any.
    ///
    /// For each group, ready members are taken greedily in task order,
    /// skipping any member with a dependency path to one already taken.
    /// Groups left with fewer than two members are ignored. Among the rest,
    /// the group whose first member is lowest wins.
    fn select_parallel(&self, ready: &[TaskId]) -> Option<Vec<TaskId>> {
        let mut best: Option<Vec<TaskId>> = None;

        for name in self.graph.parallel_group_names() {
            let mut picked: Vec<TaskId> = Vec::new();
            for member in self.graph.parallel_group(name) {
                if !ready.contains(member) {
                    continue;
                }
                if picked.iter().all(|p| self.graph.independent(p, member)) {
                    picked.push(*member);
                }
            }

            if picked.len() < 2 {
                continue;
            }
            let better = match &best {
                Some(current) => picked[0] < current[0],
                None => true,
            };
            if better {
                best = Some(picked);
            }
        }

        best
    }
}
