//! Journaling mode detection from the database header.
//!
//! Bytes 18 and 19 of the 100-byte header are the file-format write and read
//! versions. Both are 1 for rollback-journal databases and 2 for WAL
//! databases. A file too short to hold a header is a new database and can
//! only be in rollback mode.

use crate::error::{RestoreError, Result};
use std::fs::File;
use std::io::ErrorKind;
use std::os::unix::fs::FileExt;

/// Size of the database file header.
pub const HEADER_SIZE: usize = 100;

const WRITE_VERSION_OFFSET: usize = 18;
const READ_VERSION_OFFSET: usize = 19;
const WAL_FORMAT_VERSION: u8 = 2;

/// Which locking protocol the destination follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single side-file journal; locks live in the database file.
    Rollback,
    /// Write-ahead log plus shared-index file with its own lock bytes.
    WriteAheadLog,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Rollback => "rollback",
            Mode::WriteAheadLog => "wal",
        }
    }

    pub fn is_wal(&self) -> bool {
        matches!(self, Mode::WriteAheadLog)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read the header at offset 0 of `file` and classify it.
///
/// The caller is expected to hold at least a shared lock on the `SHARED`
/// region so the header cannot change mid-read.
pub fn detect(file: &File) -> Result<Mode> {
    let mut header = [0u8; HEADER_SIZE];
    match file.read_exact_at(&mut header, 0) {
        Ok(()) => classify(&header),
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(Mode::Rollback),
        Err(e) => Err(RestoreError::io("read database header", e)),
    }
}

/// Classify a complete header.
pub fn classify(header: &[u8; HEADER_SIZE]) -> Result<Mode> {
    let write_version = header[WRITE_VERSION_OFFSET];
    let read_version = header[READ_VERSION_OFFSET];

    if write_version != read_version {
        return Err(RestoreError::HeaderFormatMismatch {
            write_version,
            read_version,
        });
    }

    if write_version == WAL_FORMAT_VERSION {
        Ok(Mode::WriteAheadLog)
    } else {
        Ok(Mode::Rollback)
    }
}
