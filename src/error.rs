//! Error types for the sqlite3-restore CLI.
//!
//! Uses thiserror for derive macros and provides operator-facing error messages.

use crate::exit_codes;
use std::io;
use thiserror::Error;

/// Main error type for restore operations.
///
/// Every variant aborts the whole restore. Each maps to an exit code.
#[derive(Error, Debug)]
pub enum RestoreError {
    /// The deadline passed while another process held a conflicting lock.
    #[error("timed out acquiring {region} lock{}", holder_suffix(.holder_pid))]
    LockTimeout {
        region: &'static str,
        holder_pid: Option<i32>,
    },

    /// The wait for a lock was cancelled before the lock was granted.
    #[error("cancelled while acquiring {region} lock")]
    LockCancelled { region: &'static str },

    /// The destination header's write and read format bytes disagree.
    #[error(
        "database header write format ({write_version}) does not match read format ({read_version})"
    )]
    HeaderFormatMismatch { write_version: u8, read_version: u8 },

    /// An open/read/write/truncate/sync call failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Malformed invocation or configuration.
    #[error("{0}")]
    UserError(String),
}

fn holder_suffix(holder_pid: &Option<i32>) -> String {
    match holder_pid {
        Some(pid) => format!(" (held by pid {})", pid),
        None => String::new(),
    }
}

impl RestoreError {
    /// Wrap an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        RestoreError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            RestoreError::LockTimeout { .. } => exit_codes::LOCK_FAILURE,
            RestoreError::LockCancelled { .. } => exit_codes::LOCK_FAILURE,
            RestoreError::HeaderFormatMismatch { .. } => exit_codes::FORMAT_FAILURE,
            RestoreError::Io { .. } => exit_codes::IO_FAILURE,
            RestoreError::UserError(_) => exit_codes::USER_ERROR,
        }
    }
}

/// Result type alias for restore operations.
pub type Result<T> = std::result::Result<T, RestoreError>;
