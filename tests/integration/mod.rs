//! Integration tests for shuttle
//!
//! These run the orchestrator against real temporary git repositories and
//! against the compiled binary.

pub mod checkpoint_rollback;
pub mod cli;
pub mod helpers;
pub mod migration_flow;
