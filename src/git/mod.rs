//! Version control for checkpoints and rollback
//!
//! This module provides:
//! - The [`VersionControl`] adapter trait the managers are written against
//! - [`GitVcs`], the implementation backed by the `git` binary
//! - [`InMemoryVcs`], a linear-history fake for tests

pub mod memory;
pub mod repository;
pub mod runner;
pub mod vcs;

pub use memory::InMemoryVcs;
pub use repository::GitVcs;
pub use vcs::{CommitSummary, TagRef, VersionControl};
