//! Phase checkpoints
//! Usage: shuttle checkpoint <phase> <message> | shuttle checkpoint --list [--json]

use anyhow::{Context, Result};
use colored::Colorize;

use crate::checkpoints::Checkpoint;
use crate::git::VersionControl;

use super::common::Workspace;

/// Tag the current commit as the checkpoint for `phase`.
pub fn create(
    ws: &Workspace,
    vcs: &dyn VersionControl,
    phase: u32,
    message: &str,
) -> Result<Checkpoint> {
    let progress = ws.store.load()?;
    ws.checkpoints(vcs)
        .create(&ws.catalog, &progress, phase, message)
}

pub fn execute(ws: &Workspace, vcs: &dyn VersionControl, phase: u32, message: &str) -> Result<()> {
    let checkpoint = create(ws, vcs, phase, message)?;
    println!("Checkpoint: {}", checkpoint.tag);
    Ok(())
}

/// One line per checkpoint: phase, phase name, tag, short commit.
pub fn format_list(ws: &Workspace, checkpoints: &[Checkpoint]) -> String {
    if checkpoints.is_empty() {
        return "(no checkpoints)\n".to_string();
    }
    let mut out = String::new();
    for checkpoint in checkpoints {
        let name = ws
            .catalog
            .phase(checkpoint.phase)
            .map(|p| p.name.as_str())
            .unwrap_or("unknown phase");
        let short: String = checkpoint.commit.chars().take(8).collect();
        out.push_str(&format!(
            "  {} phase {} ({name})  {}  {}\n",
            "✓".green().bold(),
            checkpoint.phase,
            checkpoint.tag,
            short.dimmed()
        ));
    }
    out
}

pub fn list(ws: &Workspace, vcs: &dyn VersionControl, json: bool) -> Result<()> {
    let checkpoints = ws.checkpoints(vcs).list()?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&checkpoints).context("Failed to serialize checkpoints")?
        );
    } else {
        print!("{}", format_list(ws, &checkpoints));
    }
    Ok(())
}
