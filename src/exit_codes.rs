//! Exit code constants for the sqlite3-restore CLI.
//!
//! - 0: Success
//! - 1: I/O failure (open/read/write/truncate/sync on any handle)
//! - 2: User error (bad args, invalid config, same source and destination)
//! - 3: Header format mismatch (write and read version bytes disagree)
//! - 4: Lock acquisition failure (timed out or cancelled)

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// I/O failure on the destination, its side files, the source, or the parent directory.
pub const IO_FAILURE: i32 = 1;

/// User error: malformed invocation or configuration.
pub const USER_ERROR: i32 = 2;

/// The destination header disagrees with itself about its file format.
pub const FORMAT_FAILURE: i32 = 3;

/// Lock acquisition failure: a region could not be locked before the deadline.
pub const LOCK_FAILURE: i32 = 4;
