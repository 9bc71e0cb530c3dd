//! Diagnostic event stream for restore runs.
//!
//! Every step of a restore (lock waits, mode detection, side-file cleanup,
//! the copy itself) is reported as a structured [`Event`] to an explicit
//! [`EventSink`] passed down by the caller. Nothing here writes to global
//! state, so tests can capture the exact sequence with a [`MemorySink`].
//!
//! # Event Format
//!
//! Each event serializes to a single JSON object:
//! - `ts`: RFC3339 timestamp
//! - `action`: The step being reported (lock_wait, mode_detected, copy, etc.)
//! - `actor`: The owner string (e.g., `user@HOST`)
//! - `target`: Optional path the step operated on
//! - `details`: Freeform object with action-specific details
//!
//! # Sinks
//!
//! - [`NullSink`] discards everything (non-verbose runs)
//! - [`StderrSink`] prints one human-readable line per event (`-v`)
//! - [`NdjsonSink`] appends one JSON line per event to a file (`--events`)
//! - [`MemorySink`] collects events for inspection
//! - [`Tee`] fans out to two sinks

use crate::error::{RestoreError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

/// Steps that can be reported as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    /// A file handle was opened
    Open,
    /// A lock attempt conflicted with another process; waiting to retry
    LockWait,
    /// A lock region was granted
    LockAcquired,
    /// A lock region was explicitly released
    LockReleased,
    /// Journaling mode was read from the destination header
    ModeDetected,
    /// Rollback journal removed (or confirmed absent)
    RemoveJournal,
    /// Write-ahead log truncated (or confirmed absent)
    TruncateWal,
    /// Source bytes streamed into the destination
    Copy,
    /// Shared-index header zeroed
    InvalidateIndex,
    /// Parent directory flushed to stable storage
    SyncDirectory,
    /// A file handle was closed, releasing its locks
    Close,
    /// The restore aborted
    Failed,
    /// The restore completed
    Restored,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAction::Open => write!(f, "open"),
            EventAction::LockWait => write!(f, "lock_wait"),
            EventAction::LockAcquired => write!(f, "lock_acquired"),
            EventAction::LockReleased => write!(f, "lock_released"),
            EventAction::ModeDetected => write!(f, "mode_detected"),
            EventAction::RemoveJournal => write!(f, "remove_journal"),
            EventAction::TruncateWal => write!(f, "truncate_wal"),
            EventAction::Copy => write!(f, "copy"),
            EventAction::InvalidateIndex => write!(f, "invalidate_index"),
            EventAction::SyncDirectory => write!(f, "sync_directory"),
            EventAction::Close => write!(f, "close"),
            EventAction::Failed => write!(f, "failed"),
            EventAction::Restored => write!(f, "restored"),
        }
    }
}

/// A single diagnostic record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// RFC3339 timestamp when the event occurred.
    pub ts: DateTime<Utc>,

    /// The step that was performed.
    pub action: EventAction,

    /// The actor who performed the step (e.g., `user@HOST`).
    pub actor: String,

    /// Optional path the step operated on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Freeform details object with action-specific information.
    pub details: Value,
}

impl Event {
    /// Create a new event with the given action.
    ///
    /// The timestamp is set to the current time, and the actor is
    /// determined from the environment (USER@HOSTNAME).
    pub fn new(action: EventAction) -> Self {
        Self {
            ts: Utc::now(),
            action,
            actor: actor_string().to_string(),
            target: None,
            details: Value::Object(serde_json::Map::new()),
        }
    }

    /// Set the target path for this event.
    pub fn with_target(mut self, path: &Path) -> Self {
        self.target = Some(path.display().to_string());
        self
    }

    /// Set the details object for this event.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Serialize the event to a single-line JSON string.
    pub fn to_ndjson_line(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            RestoreError::UserError(format!("failed to serialize event to JSON: {}", e))
        })
    }

    /// Render the event as one human-readable line.
    pub fn to_text_line(&self) -> String {
        let mut line = format!("{} {}", self.ts.format("%H:%M:%S%.3f"), self.action);
        if let Some(target) = &self.target {
            line.push(' ');
            line.push_str(target);
        }
        if let Value::Object(map) = &self.details {
            for (key, value) in map {
                match value {
                    Value::String(s) => line.push_str(&format!(" {}={}", key, s)),
                    other => line.push_str(&format!(" {}={}", key, other)),
                }
            }
        }
        line
    }
}

/// Get the actor string for event metadata.
fn actor_string() -> &'static str {
    static ACTOR: OnceLock<String> = OnceLock::new();
    ACTOR.get_or_init(|| {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());

        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        format!("{}@{}", user, host)
    })
}

/// Destination for diagnostic events.
///
/// Emitting never fails the restore: a sink that cannot record an event
/// reports the problem itself and carries on.
pub trait EventSink {
    fn emit(&self, event: Event);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Prints one line per event to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl EventSink for StderrSink {
    fn emit(&self, event: Event) {
        eprintln!("{}", event.to_text_line());
    }
}

/// Appends each event as one JSON line to a file.
#[derive(Debug)]
pub struct NdjsonSink {
    file: Mutex<File>,
}

impl NdjsonSink {
    /// Open the events file in append mode, creating it if it doesn't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                RestoreError::io(
                    format!("failed to open events file '{}'", path.display()),
                    e,
                )
            })?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl EventSink for NdjsonSink {
    fn emit(&self, event: Event) {
        let line = match event.to_ndjson_line() {
            Ok(line) => line,
            Err(e) => {
                eprintln!("Warning: {}", e);
                return;
            }
        };

        let mut file = self.file.lock().unwrap_or_else(|poison| poison.into_inner());
        if let Err(e) = writeln!(file, "{}", line) {
            eprintln!("Warning: failed to write event: {}", e);
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Actions emitted so far, in order.
    pub fn actions(&self) -> Vec<EventAction> {
        self.events().iter().map(|e| e.action).collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .push(event);
    }
}

/// Forwards every event to two sinks.
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: EventSink, B: EventSink> Tee<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn emit(&self, event: Event) {
        self.first.emit(event.clone());
        self.second.emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: Event) {
        (**self).emit(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&self, event: Event) {
        (**self).emit(event);
    }
}
