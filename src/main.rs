//! Lockwork demonstration CLI.
//!
//! This is the main entry point for the `lockwork` CLI. It parses arguments,
//! dispatches to the scenario runner, and handles errors with proper exit
//! codes.

mod cli;
mod commands;

use cli::Cli;
use lockwork::exit_codes;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
