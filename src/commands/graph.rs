//! Dependency graph display
//! Usage: shuttle graph

use anyhow::Result;
use colored::{ColoredString, Colorize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ProgressState, TaskId, TaskStatus};
use crate::plan::DependencyGraph;

use super::common::Workspace;
use super::indicators::status_indicator;

/// Ready tasks get their own glyph; everything else uses the status glyph.
fn indicator(status: TaskStatus, ready: bool) -> ColoredString {
    if ready {
        "▶".cyan().bold()
    } else {
        status_indicator(status)
    }
}

/// Level = max(levels of all dependencies) + 1, with roots at level 0.
fn compute_levels(graph: &DependencyGraph) -> Result<BTreeMap<TaskId, usize>> {
    let mut levels = BTreeMap::new();
    for id in graph.topological_sort()? {
        let level = graph
            .node(&id)
            .map(|node| {
                node.dependencies
                    .iter()
                    .filter_map(|dep| levels.get(dep))
                    .map(|l| l + 1)
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        levels.insert(id, level);
    }
    Ok(levels)
}

fn format_dependencies(deps: &BTreeSet<TaskId>, progress: &ProgressState) -> String {
    if deps.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = deps
        .iter()
        .map(|dep| format!("{}{dep}", status_indicator(progress.status(dep))))
        .collect();
    format!(" ← {}", parts.join(", "))
}

/// Tasks laid out by dependency level, each with its dependencies' status.
pub fn build_graph_display(ws: &Workspace, progress: &ProgressState) -> Result<String> {
    if ws.graph.is_empty() {
        return Ok("(no tasks in catalog)".to_string());
    }

    let levels = compute_levels(&ws.graph)?;
    let ready: BTreeSet<TaskId> = ws.graph.ready_set(progress).into_iter().collect();

    let mut by_level: BTreeMap<usize, Vec<TaskId>> = BTreeMap::new();
    for (id, level) in &levels {
        by_level.entry(*level).or_default().push(*id);
    }

    let mut output = String::new();
    for (level, ids) in &by_level {
        let header = if *level == 0 {
            "Level 0 (no dependencies):".to_string()
        } else {
            format!("Level {level}:")
        };
        output.push_str(&header);
        output.push('\n');

        for id in ids {
            let Ok(task) = ws.catalog.get(id) else {
                continue;
            };
            let mark = indicator(progress.status(id), ready.contains(id));
            let group = match &task.parallel_group {
                Some(group) => format!(" [{}]", group.magenta()),
                None => String::new(),
            };
            let deps = format_dependencies(&task.dependencies, progress);
            output.push_str(&format!("  {mark} {} ({id}){group}{deps}\n", task.name));
        }
        output.push('\n');
    }

    Ok(output)
}

pub fn execute(ws: &Workspace) -> Result<()> {
    let progress = ws.store.load()?;

    println!();
    println!("Dependency Graph:");
    println!("=================");
    println!();
    println!("{}", build_graph_display(ws, &progress)?);

    print!("Legend: ");
    print!("{} passed  ", "✓".green().bold());
    print!("{} in progress  ", "●".blue().bold());
    print!("{} ready  ", "▶".cyan().bold());
    print!("{} pending  ", "○".white().dimmed());
    println!("{} failed", "✗".red().bold());
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::fixtures::*;

    #[test]
    fn test_levels_follow_longest_dependency_chain() {
        let (_temp, ws) = workspace();
        let levels = compute_levels(&ws.graph).unwrap();
        assert_eq!(levels[&id("1.1")], 0);
        assert_eq!(levels[&id("1.2")], 0);
        assert_eq!(levels[&id("1.3")], 1);
        assert_eq!(levels[&id("2.1")], 2);
        assert_eq!(levels[&id("2.2")], 3);
    }

    #[test]
    fn test_display_groups_by_level() {
        let (_temp, ws) = workspace();
        let progress = ws.store.load().unwrap();
        let text = build_graph_display(&ws, &progress).unwrap();

        assert!(text.contains("Level 0 (no dependencies):"));
        assert!(text.contains("Level 3:"));
        assert!(text.contains("Create tables (1.1)"));
        assert!(text.contains("schema"));
        let level0 = text.find("Level 0").unwrap();
        let seed = text.find("Seed data").unwrap();
        assert!(level0 < seed);
    }
}
