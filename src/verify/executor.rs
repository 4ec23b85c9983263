//! Shell command execution with timeout for verification commands

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

/// Grace period for the pipe readers after the child exits
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-stream cap on captured output (1MB)
const MAX_OUTPUT_SIZE: usize = 1024 * 1024;

/// Captured result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
    pub timed_out: bool,
}

/// Run `command` through `shell -c` in `working_dir`, killing it after `timeout`.
pub fn run_shell_command(
    shell: &str,
    command: &str,
    working_dir: &Path,
    timeout: Duration,
) -> Result<CommandOutput> {
    let start = Instant::now();
    let mut child = spawn(shell, command, working_dir)?;

    // Drain both pipes while waiting; a child blocked on a full pipe would
    // otherwise never exit
    let stdout_rx = drain(child.stdout.take());
    let stderr_rx = drain(child.stderr.take());

    let status = child
        .wait_timeout(timeout)
        .with_context(|| format!("Failed to wait for command: {command}"))?;

    let timed_out = status.is_none();
    if timed_out {
        warn!(%command, secs = timeout.as_secs(), "verification command timed out");
        kill(&mut child);
    }

    let stdout = collect(stdout_rx);
    let mut stderr = collect(stderr_rx);
    if timed_out {
        stderr.push_str(&format!("\n[Process killed after {}s timeout]", timeout.as_secs()));
    }

    let output = CommandOutput {
        command: command.to_string(),
        success: status.is_some_and(|s| s.success()),
        exit_code: status.and_then(|s| s.code()),
        stdout,
        stderr,
        duration: start.elapsed(),
        timed_out,
    };
    debug!(
        command = %output.command,
        success = output.success,
        exit_code = ?output.exit_code,
        elapsed_ms = output.duration.as_millis() as u64,
        "command finished"
    );
    Ok(output)
}

fn spawn(shell: &str, command: &str, working_dir: &Path) -> Result<Child> {
    Command::new(shell)
        .arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to spawn `{shell} -c {command}`"))
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(stream) => {
            thread::spawn(move || {
                let _ = tx.send(read_capped(stream));
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

fn collect(rx: mpsc::Receiver<String>) -> String {
    rx.recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string())
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Read a stream up to `MAX_OUTPUT_SIZE`, then keep draining and discard.
fn read_capped<R: Read>(mut stream: R) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let room = MAX_OUTPUT_SIZE.saturating_sub(buf.len());
                buf.extend_from_slice(&chunk[..n.min(room)]);
                truncated |= n > room;
            }
            Err(_) if buf.is_empty() => return "[error reading output]".to_string(),
            Err(_) => break,
        }
    }

    let mut text = String::from_utf8_lossy(&buf).into_owned();
    if truncated {
        text.push_str("\n[output truncated at 1MB]");
    }
    text
}
