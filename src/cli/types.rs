use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shuttle")]
#[command(about = "Phased migration task orchestrator", long_about = None)]
#[command(version)]
#[command(subcommand_help_heading = "Commands")]
pub struct Cli {
    /// Project root (defaults to $SHUTTLE_PROJECT_DIR, $CLAUDE_PROJECT_DIR, then the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the next work directive (COMPLETE, PARALLEL:..., SEQUENTIAL:..., BLOCKED:..., ...)
    Next,

    /// Show progress for every phase and task
    Status,

    /// Show the dependency graph by level
    Graph,

    /// Show everything known about one task
    Details {
        /// Task id, e.g. 1.1
        task_id: String,
    },

    /// Mark a pending task as in progress (its dependencies must have passed)
    Start {
        /// Task id, e.g. 1.1
        task_id: String,
    },

    /// Mark an in-progress task as passed
    Complete {
        /// Task id, e.g. 1.1
        task_id: String,

        /// Run the task's verification command first; failure records the task as failed
        #[arg(long)]
        verify: bool,
    },

    /// Record a failure for an in-progress task
    Fail {
        /// Task id, e.g. 1.1
        task_id: String,

        /// What went wrong
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Create a checkpoint tag for a fully passed phase, or list checkpoints
    Checkpoint {
        /// Phase number
        #[arg(required_unless_present = "list")]
        phase: Option<u32>,

        /// Checkpoint message
        #[arg(required_unless_present = "list", num_args = 1..)]
        message: Vec<String>,

        /// List existing checkpoints
        #[arg(long, conflicts_with = "phase")]
        list: bool,

        /// With --list, print JSON
        #[arg(long, requires = "list")]
        json: bool,
    },

    /// Reset code and progress to an earlier checkpoint (prints the plan unless --yes)
    Rollback {
        /// Phase whose checkpoint to return to (default: latest before the earliest failure)
        #[arg(long, value_name = "PHASE")]
        to: Option<u32>,

        /// Confirm the rollback
        #[arg(long)]
        yes: bool,
    },

    /// Retry a failed task, or discard all progress with --all --yes
    Reset {
        /// Task id, e.g. 1.1
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        task_id: Option<String>,

        /// Delete the progress file
        #[arg(long)]
        all: bool,

        /// Confirm --all
        #[arg(long, requires = "all")]
        yes: bool,
    },

    /// Run a validator: bash, frontend, security, standards
    Validate {
        /// Validator name
        category: String,

        /// Command text (bash), file (frontend) or directory (security); bash reads stdin when omitted
        target: Option<String>,
    },
}
