//! Filesystem persistence: advisory locking, atomic replacement and the
//! progress store built on them

pub mod locking;
pub mod progress;

pub use progress::{FailureRecord, ProgressStore, DEFAULT_PROGRESS_PATH};
