//! Verification collaborators
//!
//! This module provides:
//! - [`VerificationRunner`]: runs a task's verification command and reports pass/fail
//! - [`ValidatorRegistry`]: named lint and safety checks invoked explicitly

pub mod executor;
pub mod runner;
pub mod validators;

pub use executor::{run_shell_command, CommandOutput};
pub use runner::{
    ShellVerificationRunner, VerificationOutcome, VerificationRunner, DEFAULT_VERIFY_TIMEOUT,
};
pub use validators::{
    Finding, Severity, ValidationInput, ValidationReport, Validator, ValidatorRegistry,
};
