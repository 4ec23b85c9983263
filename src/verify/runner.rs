//! Verification runners: decide whether a task's work actually passes

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::models::Task;

use super::executor::{run_shell_command, CommandOutput};

/// Default per-command timeout.
pub const DEFAULT_VERIFY_TIMEOUT: Duration = Duration::from_secs(300);

/// Longest failure message kept in the progress file.
const MAX_MESSAGE_LEN: usize = 500;

/// Pass/fail verdict for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub passed: bool,
    /// Short human-readable summary; recorded as the error message on failure.
    pub message: String,
}

impl VerificationOutcome {
    pub fn passed(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// Runs a task's verification. The orchestrator only sees the verdict.
pub trait VerificationRunner {
    fn verify(&self, task: &Task) -> Result<VerificationOutcome>;
}

/// Runs `verification_command` through a shell in the project root.
#[derive(Debug, Clone)]
pub struct ShellVerificationRunner {
    shell: String,
    working_dir: PathBuf,
    timeout: Duration,
}

impl ShellVerificationRunner {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell: "sh".to_string(),
            working_dir: working_dir.into(),
            timeout: DEFAULT_VERIFY_TIMEOUT,
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl VerificationRunner for ShellVerificationRunner {
    fn verify(&self, task: &Task) -> Result<VerificationOutcome> {
        let command = task.verification_command.trim();
        if command.is_empty() {
            return Ok(VerificationOutcome::passed("no verification command"));
        }

        info!(task = %task.id, %command, "running verification");
        let output = run_shell_command(&self.shell, command, &self.working_dir, self.timeout)?;
        Ok(outcome_from(&output))
    }
}

fn outcome_from(output: &CommandOutput) -> VerificationOutcome {
    if output.success {
        return VerificationOutcome::passed(format!(
            "verification passed in {:.1}s",
            output.duration.as_secs_f64()
        ));
    }

    let reason = if output.timed_out {
        "verification timed out".to_string()
    } else {
        match output.exit_code {
            Some(code) => format!("verification exited with code {code}"),
            None => "verification terminated by signal".to_string(),
        }
    };

    // Prefer stderr; fall back to the tail of stdout
    let detail = [&output.stderr, &output.stdout]
        .into_iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(last_line)
        .unwrap_or_default();

    let message = if detail.is_empty() {
        reason
    } else {
        format!("{reason}: {detail}")
    };
    VerificationOutcome::failed(truncate(&message, MAX_MESSAGE_LEN))
}

fn last_line(text: &str) -> &str {
    text.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskId;

    fn task(command: &str) -> Task {
        Task::new(TaskId::new(1, 1), "demo").with_verification(command)
    }

    fn runner() -> (tempfile::TempDir, ShellVerificationRunner) {
        let dir = tempfile::tempdir().unwrap();
        let runner = ShellVerificationRunner::new(dir.path()).with_timeout(Duration::from_secs(10));
        (dir, runner)
    }

    #[test]
    fn test_empty_command_passes() {
        let (_dir, runner) = runner();
        let outcome = runner.verify(&task("  ")).unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn test_runs_in_working_dir() {
        let (dir, runner) = runner();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        assert!(runner.verify(&task("test -f marker.txt")).unwrap().passed);
        assert!(!runner.verify(&task("test -f missing.txt")).unwrap().passed);
    }

    #[test]
    fn test_failure_message_uses_stderr() {
        let (_dir, runner) = runner();
        let outcome = runner
            .verify(&task("echo progress; echo 'type error in usage.ts' >&2; exit 2"))
            .unwrap();
        assert!(!outcome.passed);
        assert_eq!(
            outcome.message,
            "verification exited with code 2: type error in usage.ts"
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "é".repeat(300);
        let t = truncate(&s, 5);
        assert!(t.ends_with("..."));
        assert!(t.len() <= 8);
    }
}
