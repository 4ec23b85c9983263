//! Structural validation of catalog definitions
//!
//! Cycle detection is not done here: it belongs to the dependency graph, which
//! is built from an already structurally valid catalog.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Phase, Task, TaskId};

use super::schema::{CatalogFile, TaskDefinition};

/// Only this catalog format version is understood.
pub const CATALOG_VERSION: u32 = 1;

/// Convert raw definitions into typed tasks, collecting every problem found.
pub fn typed_from_file(file: &CatalogFile) -> Result<(Vec<Phase>, Vec<Task>), Vec<String>> {
    let mut errors = Vec::new();

    if file.catalog.version != CATALOG_VERSION {
        errors.push(format!(
            "Unsupported catalog version: {}. Only version {CATALOG_VERSION} is supported.",
            file.catalog.version
        ));
    }

    let phases: Vec<Phase> = file
        .phases
        .iter()
        .map(|p| Phase::new(p.number, p.name.clone()))
        .collect();

    let mut tasks = Vec::new();
    for def in &file.tasks {
        match typed_task(def) {
            Ok(task) => tasks.push(task),
            Err(mut errs) => errors.append(&mut errs),
        }
    }

    if errors.is_empty() {
        Ok((phases, tasks))
    } else {
        Err(errors)
    }
}

fn typed_task(def: &TaskDefinition) -> Result<Task, Vec<String>> {
    let mut errors = Vec::new();

    let id: Option<TaskId> = match def.id.parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push(format!(
                "Task id '{}' must have the form <phase>.<ordinal> with positive integers",
                def.id
            ));
            None
        }
    };

    let mut dependencies = BTreeSet::new();
    for dep in &def.dependencies {
        match dep.parse::<TaskId>() {
            Ok(dep_id) => {
                dependencies.insert(dep_id);
            }
            Err(_) => errors.push(format!("Task {}: invalid dependency id '{dep}'", def.id)),
        }
    }

    if def.name.trim().is_empty() {
        errors.push(format!("Task {}: name cannot be empty", def.id));
    }

    if def.parallel_group.as_deref().is_some_and(|g| g.trim().is_empty()) {
        errors.push(format!("Task {}: parallel_group cannot be blank", def.id));
    }

    match id {
        Some(id) if errors.is_empty() => {
            let mut task = Task::new(id, def.name.clone())
                .with_dependencies(dependencies)
                .with_verification(def.verify.clone())
                .with_files(def.files.clone());
            task.phase = def.phase;
            task.parallel_group = def.parallel_group.clone();
            task.requires_docker = def.requires_docker;
            Ok(task)
        }
        _ => Err(errors),
    }
}

/// Validate typed phases and tasks against each other.
///
/// Checks:
/// - phase numbers are unique and every phase has at least one task
/// - task ids are unique and their phase prefix matches `phase`
/// - every task's phase is declared
/// - every dependency exists and lives in the same or an earlier phase
///
/// Self-dependencies are left for cycle detection.
pub fn validate(phases: &[Phase], tasks: &[Task]) -> Vec<String> {
    let mut errors = Vec::new();

    let mut phase_numbers = BTreeSet::new();
    for phase in phases {
        if phase.number == 0 {
            errors.push("Phase numbers start at 1".to_string());
        }
        if !phase_numbers.insert(phase.number) {
            errors.push(format!("Duplicate phase number: {}", phase.number));
        }
    }

    let mut by_id: BTreeMap<TaskId, &Task> = BTreeMap::new();
    for task in tasks {
        if by_id.insert(task.id, task).is_some() {
            errors.push(format!("Duplicate task id: {}", task.id));
        }
        if task.id.phase() != task.phase {
            errors.push(format!(
                "Task {} declares phase {} but its id belongs to phase {}",
                task.id,
                task.phase,
                task.id.phase()
            ));
        }
        if !phase_numbers.contains(&task.phase) {
            errors.push(format!(
                "Task {} references undeclared phase {}",
                task.id, task.phase
            ));
        }
    }

    for task in tasks {
        for dep in &task.dependencies {
            if *dep == task.id {
                continue;
            }
            match by_id.get(dep) {
                None => errors.push(format!("Task {} depends on unknown task {dep}", task.id)),
                Some(dep_task) if dep_task.phase > task.phase => errors.push(format!(
                    "Task {} (phase {}) depends on {dep} from later phase {}",
                    task.id, task.phase, dep_task.phase
                )),
                Some(_) => {}
            }
        }
    }

    for number in &phase_numbers {
        if !tasks.iter().any(|t| t.phase == *number) {
            errors.push(format!("Phase {number} has no tasks"));
        }
    }

    errors
}
