//! Next work directive
//! Usage: shuttle next

use anyhow::Result;

use crate::git::VersionControl;
use crate::scheduler::Directive;

use super::common::Workspace;

/// Compute the directive for the current progress. Never mutates state.
pub fn run(ws: &Workspace, vcs: Option<&dyn VersionControl>) -> Result<Directive> {
    let progress = ws.store.load()?;
    Ok(ws.next_directive(&progress, vcs))
}

pub fn execute(ws: &Workspace, vcs: Option<&dyn VersionControl>) -> Result<()> {
    println!("{}", run(ws, vcs)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::common::fixtures::*;

    #[test]
    fn test_fresh_state_hands_out_parallel_group() {
        let (_temp, ws) = workspace();
        let directive = run(&ws, None).unwrap();
        assert_eq!(directive.to_string(), "PARALLEL:1.1 1.2");
    }

    #[test]
    fn test_next_does_not_touch_progress_file() {
        let (_temp, ws) = workspace();
        run(&ws, None).unwrap();
        run(&ws, None).unwrap();
        assert!(!ws.store.path().exists());
    }

    #[test]
    fn test_sequential_after_group_passes() {
        let (_temp, ws) = workspace();
        pass(&ws, &["1.1", "1.2"]);
        assert_eq!(run(&ws, None).unwrap(), Directive::Sequential(id("1.3")));
    }

    #[test]
    fn test_complete_when_everything_passed() {
        let (_temp, ws) = workspace();
        pass(&ws, &["1.1", "1.2", "1.3", "2.1", "2.2"]);
        assert_eq!(run(&ws, None).unwrap(), Directive::Complete);
    }
}
