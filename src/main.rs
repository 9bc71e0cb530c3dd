//! sqlite3-restore: replace a live database file in place.
//!
//! This is the main entry point for the CLI. It parses arguments, runs the
//! restore, and maps errors to exit codes.

use sqlite3_restore::cli::Cli;
use sqlite3_restore::{commands, exit_codes};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::run(cli) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}
