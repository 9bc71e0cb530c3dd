//! Journal and WAL side-file cleanup.
//!
//! Both side files are optional: a database that was closed cleanly may have
//! neither. A missing file is success, reported as `false`.

use crate::error::{RestoreError, Result};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

/// Delete `path` if it exists. Returns whether a file was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RestoreError::io(
            format!("remove '{}'", path.display()),
            e,
        )),
    }
}

/// Truncate `path` to zero length if it exists, without creating it.
///
/// Returns whether a file was truncated. The inode is kept so readers that
/// have the log open keep a valid handle.
pub fn truncate_if_exists(path: &Path) -> Result<bool> {
    let file = match OpenOptions::new().write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(RestoreError::io(
                format!("open '{}' for truncation", path.display()),
                e,
            ));
        }
    };

    file.set_len(0)
        .map_err(|e| RestoreError::io(format!("truncate '{}'", path.display()), e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;
    use tempfile::TempDir;

    #[test]
    fn remove_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.db-journal");
        std::fs::write(&path, b"journal").unwrap();

        assert!(remove_if_exists(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn remove_missing_file_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        assert!(!remove_if_exists(&temp.path().join("app.db-journal")).unwrap());
    }

    #[test]
    fn remove_directory_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.db-journal");
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(
            remove_if_exists(&path),
            Err(RestoreError::Io { .. })
        ));
    }

    #[test]
    fn truncate_keeps_inode() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.db-wal");
        std::fs::write(&path, vec![9u8; 8192]).unwrap();
        let ino = std::fs::metadata(&path).unwrap().ino();

        assert!(truncate_if_exists(&path).unwrap());

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.len(), 0);
        assert_eq!(meta.ino(), ino);
    }

    #[test]
    fn truncate_missing_file_does_not_create_it() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("app.db-wal");

        assert!(!truncate_if_exists(&path).unwrap());
        assert!(!path.exists());
    }
}
