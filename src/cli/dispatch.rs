use anyhow::Result;
use shuttle::commands::{
    checkpoint, complete, details, fail, graph, next, reset, rollback, start, status, validate,
    Workspace,
};
use shuttle::config::resolve_project_dir;
use shuttle::git::{GitVcs, VersionControl};
use shuttle::verify::{ValidatorRegistry, VerificationRunner};
use tracing::debug;

use super::types::{Cli, Commands};

/// The project's git repository if there is one. Read-only commands work
/// without it; checkpoint and rollback require it.
fn optional_git(ws: &Workspace) -> Option<GitVcs> {
    match ws.git() {
        Ok(vcs) => Some(vcs),
        Err(e) => {
            debug!("no git repository, checkpoints unavailable: {e:#}");
            None
        }
    }
}

fn as_vcs(vcs: &Option<GitVcs>) -> Option<&dyn VersionControl> {
    vcs.as_ref().map(|v| v as &dyn VersionControl)
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let root = resolve_project_dir(cli.project_dir.as_deref())?;
    let ws = Workspace::open(root)?;

    match cli.command {
        Commands::Next => {
            let git = optional_git(&ws);
            next::execute(&ws, as_vcs(&git))
        }
        Commands::Status => {
            let git = optional_git(&ws);
            status::execute(&ws, as_vcs(&git))
        }
        Commands::Graph => graph::execute(&ws),
        Commands::Details { task_id } => details::execute(&ws, &task_id),
        Commands::Start { task_id } => start::execute(&ws, &task_id),
        Commands::Complete { task_id, verify } => {
            let git = optional_git(&ws);
            let verifier = ws.verifier();
            let validators = ValidatorRegistry::with_builtins()?;
            complete::execute(
                &ws,
                &task_id,
                verify.then_some(&verifier as &dyn VerificationRunner),
                Some(&validators),
                as_vcs(&git),
            )
        }
        Commands::Fail { task_id, message } => {
            let git = optional_git(&ws);
            fail::execute(&ws, &task_id, &message.join(" "), as_vcs(&git))
        }
        Commands::Checkpoint {
            phase,
            message,
            list,
            json,
        } => {
            let git = ws.git()?;
            match phase {
                Some(phase) if !list => checkpoint::execute(&ws, &git, phase, &message.join(" ")),
                _ => checkpoint::list(&ws, &git, json),
            }
        }
        Commands::Rollback { to, yes } => {
            let git = ws.git()?;
            rollback::execute(&ws, &git, to, yes)
        }
        Commands::Reset { task_id, all, yes } => reset::execute(&ws, task_id.as_deref(), all, yes),
        Commands::Validate { category, target } => validate::execute(&ws, &category, target),
    }
}
