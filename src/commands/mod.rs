//! Command implementation for sqlite3-restore.
//!
//! Resolves the effective settings from the command line and the optional
//! config file, wires up the event sinks, and runs the restore.

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::events::{EventSink, NdjsonSink, NullSink, StderrSink, Tee};
use crate::restore::{self, RestoreReport, RestoreTask};
use std::path::PathBuf;
use std::time::Duration;

/// Settings after merging command-line flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub task: RestoreTask,
    pub verbose: bool,
    pub events_file: Option<PathBuf>,
}

/// Run the restore described by the command line.
pub fn run(cli: Cli) -> Result<()> {
    let settings = resolve(cli)?;
    let sink = build_sink(&settings)?;

    let cancellation = settings.task.cancellation();
    let report = restore::restore(&settings.task, &cancellation, sink.as_ref())?;

    if settings.verbose {
        eprintln!("{}", summary(&settings.task, &report));
    }
    Ok(())
}

/// Merge flags over the config file. A flag always wins when given.
pub fn resolve(cli: Cli) -> Result<Settings> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let timeout: Option<Duration> = match cli.timeout {
        Some(timeout) => Some(timeout),
        None => config.timeout(),
    };

    Ok(Settings {
        task: RestoreTask::new(cli.source, cli.destination).with_timeout(timeout),
        verbose: cli.verbose || config.verbose,
        events_file: cli.events.or(config.events_file),
    })
}

fn build_sink(settings: &Settings) -> Result<Box<dyn EventSink>> {
    let ndjson = match &settings.events_file {
        Some(path) => Some(NdjsonSink::open(path)?),
        None => None,
    };

    let sink: Box<dyn EventSink> = match (settings.verbose, ndjson) {
        (true, Some(file)) => Box::new(Tee::new(StderrSink, file)),
        (true, None) => Box::new(StderrSink),
        (false, Some(file)) => Box::new(file),
        (false, None) => Box::new(NullSink),
    };
    Ok(sink)
}

fn summary(task: &RestoreTask, report: &RestoreReport) -> String {
    format!(
        "restored '{}' from '{}' ({} mode, {} bytes)",
        task.destination.display(),
        task.source.display(),
        report.mode,
        report.bytes_copied
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RestoreError;
    use crate::mode::Mode;
    use crate::restore::DEFAULT_TIMEOUT;
    use clap::Parser;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["sqlite3-restore"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_without_config() {
        let settings = resolve(parse(&["a.db", "b.db"])).unwrap();
        assert_eq!(settings.task.source, PathBuf::from("a.db"));
        assert_eq!(settings.task.destination, PathBuf::from("b.db"));
        assert_eq!(settings.task.timeout, Some(DEFAULT_TIMEOUT));
        assert!(!settings.verbose);
        assert!(settings.events_file.is_none());
    }

    #[test]
    fn zero_timeout_flag_waits_forever() {
        let settings = resolve(parse(&["--timeout", "0", "a.db", "b.db"])).unwrap();
        assert_eq!(settings.task.timeout, None);
    }

    #[test]
    fn config_fills_unset_flags() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("restore.yaml");
        std::fs::write(
            &config_path,
            "timeout_ms: 1500\nverbose: true\nevents_file: events.ndjson\n",
        )
        .unwrap();

        let settings = resolve(parse(&[
            "--config",
            config_path.to_str().unwrap(),
            "a.db",
            "b.db",
        ]))
        .unwrap();
        assert_eq!(settings.task.timeout, Some(Duration::from_millis(1500)));
        assert!(settings.verbose);
        assert_eq!(settings.events_file, Some(PathBuf::from("events.ndjson")));
    }

    #[test]
    fn flags_override_config() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("restore.yaml");
        std::fs::write(&config_path, "timeout_ms: 0\nevents_file: config.ndjson\n").unwrap();

        let settings = resolve(parse(&[
            "--config",
            config_path.to_str().unwrap(),
            "--timeout",
            "2s",
            "--events",
            "flag.ndjson",
            "a.db",
            "b.db",
        ]))
        .unwrap();
        assert_eq!(settings.task.timeout, Some(Duration::from_secs(2)));
        assert_eq!(settings.events_file, Some(PathBuf::from("flag.ndjson")));
    }

    #[test]
    fn missing_config_is_user_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");

        let err = resolve(parse(&["--config", missing.to_str().unwrap(), "a.db", "b.db"]))
            .unwrap_err();
        assert!(matches!(err, RestoreError::UserError(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn run_restores_and_writes_events() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("backup.db");
        let destination = temp.path().join("live.db");
        let events = temp.path().join("events.ndjson");
        std::fs::write(&source, b"new contents").unwrap();
        std::fs::write(&destination, b"old contents that are longer").unwrap();

        run(parse(&[
            "--events",
            events.to_str().unwrap(),
            source.to_str().unwrap(),
            destination.to_str().unwrap(),
        ]))
        .unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"new contents");

        let log = std::fs::read_to_string(&events).unwrap();
        let last: serde_json::Value =
            serde_json::from_str(log.lines().last().unwrap()).unwrap();
        assert_eq!(last["action"], "restored");
        assert_eq!(last["details"]["bytes"], 12);
    }

    #[test]
    fn summary_names_both_files() {
        let task = RestoreTask::new("backup.db", "live.db");
        let report = RestoreReport {
            mode: Mode::WriteAheadLog,
            bytes_copied: 4096,
        };
        assert_eq!(
            summary(&task, &report),
            "restored 'live.db' from 'backup.db' (wal mode, 4096 bytes)"
        );
    }
}
