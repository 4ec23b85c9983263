pub mod phase;
pub mod progress;
pub mod task;

pub use phase::Phase;
pub use progress::{ProgressState, TaskProgress, PROGRESS_FORMAT_VERSION};
pub use task::{Task, TaskId, TaskStatus, Transition};
