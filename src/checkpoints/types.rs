//! Checkpoint naming
//!
//! Checkpoints are tags named `checkpoint/<project>/phase-<N>`, one per
//! completed phase, strictly increasing by phase number.

use serde::Serialize;

const TAG_ROOT: &str = "checkpoint";

/// A checkpoint tag and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub phase: u32,
    pub tag: String,
    pub commit: String,
}

/// Prefix shared by every checkpoint tag of `project`.
pub fn tag_prefix(project: &str) -> String {
    format!("{TAG_ROOT}/{project}/")
}

pub fn tag_name(project: &str, phase: u32) -> String {
    format!("{}phase-{phase}", tag_prefix(project))
}

/// Phase number encoded in a checkpoint tag of `project`, if it is one.
pub fn parse_phase(project: &str, tag: &str) -> Option<u32> {
    let rest = tag.strip_prefix(&tag_prefix(project))?;
    let number = rest.strip_prefix("phase-")?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse().ok().filter(|n| *n > 0)
}

/// Commit message used when a checkpoint has to commit pending changes.
pub fn commit_message(phase: u32, message: &str) -> String {
    format!("checkpoint(phase-{phase}): {message}")
}
