//! Command implementations behind the CLI
//!
//! Each module exposes a pure `run`/`format_*` layer that tests drive
//! directly, and an `execute` entry point that prints for the binary.
//! Machine-readable results go to stdout on a single line; diagnostics go
//! to stderr.

pub mod checkpoint;
pub mod common;
pub mod complete;
pub mod details;
pub mod fail;
pub mod graph;
pub mod indicators;
pub mod next;
pub mod reset;
pub mod rollback;
pub mod start;
pub mod status;
pub mod validate;

pub use common::Workspace;
