//! Directory durability.

use crate::error::{RestoreError, Result};
use std::fs::File;
use std::path::Path;

/// Flush a directory's entries to stable storage.
///
/// Needed after removing or truncating side files: without it a crash could
/// bring back a stale journal next to the restored database.
pub fn sync_dir(dir: &Path) -> Result<()> {
    let handle = File::open(dir)
        .map_err(|e| RestoreError::io(format!("open directory '{}'", dir.display()), e))?;
    handle
        .sync_all()
        .map_err(|e| RestoreError::io(format!("directory sync '{}'", dir.display()), e))
}
