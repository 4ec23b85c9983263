use std::fmt;

use crate::models::TaskId;

/// What the caller should do next.
///
/// `Display` renders the one-line machine format agents parse, e.g.
/// `PARALLEL:1.1 1.2` or `SEQUENTIAL:1.3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Every task has passed.
    Complete,
    /// Nothing can move until these failed tasks are retried or rolled back.
    Blocked(Vec<TaskId>),
    /// A failure in this phase should be handled with `rollback`.
    RollbackNeeded(u32),
    /// Independent tasks that may be worked on concurrently.
    Parallel(Vec<TaskId>),
    Sequential(TaskId),
    /// Nothing is ready; these tasks are in progress.
    Waiting(Vec<TaskId>),
}

impl Directive {
    pub fn keyword(&self) -> &'static str {
        match self {
            Directive::Complete => "COMPLETE",
            Directive::Blocked(_) => "BLOCKED",
            Directive::RollbackNeeded(_) => "ROLLBACK_NEEDED",
            Directive::Parallel(_) => "PARALLEL",
            Directive::Sequential(_) => "SEQUENTIAL",
            Directive::Waiting(_) => "WAITING",
        }
    }
}

fn join(ids: &[TaskId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Complete => write!(f, "{}", self.keyword()),
            Directive::RollbackNeeded(phase) => write!(f, "{}:{phase}", self.keyword()),
            Directive::Sequential(id) => write!(f, "{}:{id}", self.keyword()),
            Directive::Blocked(ids) | Directive::Parallel(ids) | Directive::Waiting(ids) => {
                write!(f, "{}:{}", self.keyword(), join(ids))
            }
        }
    }
}
