mod transitions;
mod types;


pub use types::{Task, TaskId, TaskStatus, Transition};
