//! CLI argument parsing for sqlite3-restore.
//!
//! Uses clap derive macros for declarative argument definitions. The actual
//! work happens in the `commands` module.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Replace a live database file in place.
///
/// Takes the same byte-range locks the database engine uses for exclusive
/// access, so processes that keep the destination open wait for the swap
/// instead of reading a half-written file. The destination keeps its inode.
#[derive(Parser, Debug)]
#[command(name = "sqlite3-restore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database file to copy from.
    #[arg(value_name = "SRC")]
    pub source: PathBuf,

    /// Live database file to overwrite (created if missing).
    #[arg(value_name = "DST")]
    pub destination: PathBuf,

    /// How long to wait for locks (e.g. 500ms, 5s, 2m; 0 waits forever).
    /// Defaults to 5s unless the config file says otherwise.
    #[arg(long, value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Print each step to stderr.
    #[arg(short, long)]
    pub verbose: bool,

    /// Append each step as a JSON line to this file.
    #[arg(long, value_name = "FILE")]
    pub events: Option<PathBuf>,

    /// YAML config file with defaults for the options above.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Parse `500ms`, `5s`, `2m`, or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);

    if digits.is_empty() {
        return Err(format!("invalid duration '{}': expected a number", input));
    }
    let value: u64 = digits
        .parse()
        .map_err(|e| format!("invalid duration '{}': {}", input, e))?;

    match unit {
        "" | "s" => Ok(Duration::from_secs(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("invalid duration '{}': too large", input)),
        other => Err(format!(
            "invalid duration '{}': unknown unit '{}' (use ms, s, or m)",
            input, other
        )),
    }
}
