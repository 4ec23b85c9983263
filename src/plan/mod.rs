//! Task catalog and the dependency graph built from it

pub mod catalog;
pub mod graph;

pub use catalog::TaskCatalog;
pub use graph::{DependencyGraph, TaskNode};
