//! Path resolution for a destination database and its side files.
//!
//! The engine derives every auxiliary file name by appending a suffix to the
//! database path, so these names have to be built exactly the same way:
//! `DST-journal`, `DST-wal`, `DST-shm`.

use crate::error::{RestoreError, Result};
use std::ffi::OsString;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

pub const JOURNAL_SUFFIX: &str = "-journal";
pub const WAL_SUFFIX: &str = "-wal";
pub const SHM_SUFFIX: &str = "-shm";

/// Resolved paths for one destination database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabasePaths {
    /// The database file itself.
    pub db: PathBuf,

    /// Rollback journal (`{db}-journal`).
    pub journal: PathBuf,

    /// Write-ahead log (`{db}-wal`).
    pub wal: PathBuf,

    /// Shared-index file (`{db}-shm`).
    pub shm: PathBuf,

    /// Directory holding all of the above (`.` for a bare file name).
    pub parent_dir: PathBuf,
}

impl DatabasePaths {
    pub fn new<P: AsRef<Path>>(db: P) -> Self {
        let db = db.as_ref().to_path_buf();
        let parent_dir = match db.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        Self {
            journal: with_suffix(&db, JOURNAL_SUFFIX),
            wal: with_suffix(&db, WAL_SUFFIX),
            shm: with_suffix(&db, SHM_SUFFIX),
            parent_dir,
            db,
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Refuse to restore a file onto itself.
///
/// POSIX locks are per process: once the destination is locked, opening and
/// closing a second handle to the same inode (the source) would silently drop
/// every lock. Paths that do not exist yet cannot be the same file.
pub fn ensure_distinct(source: &Path, destination: &Path) -> Result<()> {
    let (Ok(src), Ok(dst)) = (source.metadata(), destination.metadata()) else {
        return Ok(());
    };

    if src.dev() == dst.dev() && src.ino() == dst.ino() {
        return Err(RestoreError::UserError(format!(
            "source '{}' and destination '{}' are the same file",
            source.display(),
            destination.display()
        )));
    }

    Ok(())
}
