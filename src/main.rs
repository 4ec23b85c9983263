mod cli;

use clap::Parser;
use colored::Colorize;
use shuttle::error::OrchestratorError;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{dispatch, Cli};

/// Log filter variable; `RUST_LOG` is honoured when it is unset.
const LOG_ENV: &str = "SHUTTLE_LOG";

/// Logs go to stderr so stdout stays a clean, single-line protocol.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("shuttle=debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            let code = e
                .downcast_ref::<OrchestratorError>()
                .map(OrchestratorError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
