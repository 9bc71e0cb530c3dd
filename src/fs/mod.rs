//! Filesystem utilities for sqlite3-restore.
//!
//! Everything here mutates the destination or its side files in place and
//! must only run while the full exclusive lock set is held.

mod copy;
mod side_files;
mod sync;

pub use copy::{INDEX_HEADER_SIZE, copy_contents, invalidate_index};
pub use side_files::{remove_if_exists, truncate_if_exists};
pub use sync::sync_dir;
