use super::task::TaskId;

/// Ordered group of tasks sharing a phase number.
///
/// A phase completes when all its tasks have passed; that is the trigger for
/// creating its checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phase {
    pub number: u32,
    pub name: String,
    /// Member tasks in `(phase, ordinal)` order.
    pub tasks: Vec<TaskId>,
}

impl Phase {
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn contains(&self, task: &TaskId) -> bool {
        self.tasks.contains(task)
    }
}
