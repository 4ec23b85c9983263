//! Colored status glyphs and labels for human-readable output

use colored::{ColoredString, Colorize};

use crate::models::TaskStatus;
use crate::scheduler::Directive;

pub fn status_indicator(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Passed => "✓".green().bold(),
        TaskStatus::InProgress => "●".blue().bold(),
        TaskStatus::Pending => "○".white().dimmed(),
        TaskStatus::Failed => "✗".red().bold(),
    }
}

pub fn status_label(status: TaskStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        TaskStatus::Passed => label.green(),
        TaskStatus::InProgress => label.blue(),
        TaskStatus::Pending => label.dimmed(),
        TaskStatus::Failed => label.red(),
    }
}

/// A directive line colored by urgency.
pub fn directive_colored(directive: &Directive) -> ColoredString {
    let line = directive.to_string();
    match directive {
        Directive::Complete => line.green().bold(),
        Directive::Parallel(_) | Directive::Sequential(_) => line.cyan().bold(),
        Directive::Waiting(_) => line.blue(),
        Directive::Blocked(_) | Directive::RollbackNeeded(_) => line.red().bold(),
    }
}
