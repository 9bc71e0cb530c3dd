//! In-place content replacement.
//!
//! The destination is overwritten through its existing handle rather than
//! replaced by rename, so its inode (and every other process's view of it)
//! stays the same.

use crate::error::{RestoreError, Result};
use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::os::unix::fs::FileExt;

/// Size of the shared-index header that readers check before trusting the index.
pub const INDEX_HEADER_SIZE: usize = 136;

/// Overwrite `dst` with the full contents of `src` and make it durable.
///
/// Both handles are rewound first. After the copy `dst` is truncated to the
/// source length (covering both growth and shrinkage) and synced, data and
/// metadata. Returns the number of bytes copied.
///
/// A failure part way through leaves `dst` holding a mix of old and new
/// bytes; nothing here can make the copy atomic.
pub fn copy_contents(mut src: &File, mut dst: &File) -> Result<u64> {
    let size = src
        .metadata()
        .map_err(|e| RestoreError::io("stat source database", e))?
        .len();

    src.seek(SeekFrom::Start(0))
        .map_err(|e| RestoreError::io("rewind source database", e))?;
    dst.seek(SeekFrom::Start(0))
        .map_err(|e| RestoreError::io("rewind destination database", e))?;

    let copied =
        io::copy(&mut src, &mut dst).map_err(|e| RestoreError::io("copy database", e))?;

    dst.set_len(size)
        .map_err(|e| RestoreError::io("set destination database size", e))?;
    dst.sync_all()
        .map_err(|e| RestoreError::io("sync database", e))?;

    Ok(copied)
}

/// Zero the first [`INDEX_HEADER_SIZE`] bytes of the shared-index file.
///
/// Readers see an invalid header and rebuild the index from the new
/// database and log instead of trusting stale frame mappings.
pub fn invalidate_index(shm: &File) -> Result<()> {
    shm.write_all_at(&[0u8; INDEX_HEADER_SIZE], 0)
        .map_err(|e| RestoreError::io("invalidate shm file", e))
}
