//! An open file handle together with the lock regions held through it.

use super::driver;
use super::policy::Cancellation;
use super::region::LockRegion;
use super::types::LockMode;
use crate::error::{RestoreError, Result};
use crate::events::{Event, EventAction, EventSink};
use std::fs::{File, OpenOptions};
use std::os::fd::IntoRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

/// Lock state for one handle.
///
/// Closing the handle (explicitly via [`LockSession::close`] or by dropping
/// the session) releases every lock held on it in one step, as far as other
/// processes can observe.
#[derive(Debug)]
pub struct LockSession {
    file: File,
    path: PathBuf,
    held: Vec<(LockRegion, LockMode)>,
}

impl LockSession {
    /// Open `path` read/write, creating an empty file if it does not exist.
    pub fn open(path: &Path, sink: &dyn EventSink) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o666)
            .open(path)
            .map_err(|e| RestoreError::io(format!("open '{}'", path.display()), e))?;

        sink.emit(Event::new(EventAction::Open).with_target(path));
        Ok(Self::from_file(file, path))
    }

    pub fn from_file(file: File, path: &Path) -> Self {
        Self {
            file,
            path: path.to_path_buf(),
            held: Vec::new(),
        }
    }

    pub fn file(&self) -> &File {
        &self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Regions currently held, in acquisition order.
    pub fn held(&self) -> &[(LockRegion, LockMode)] {
        &self.held
    }

    /// Acquire (or upgrade to) `mode` on `region`.
    pub fn acquire(
        &mut self,
        region: LockRegion,
        mode: LockMode,
        cancellation: &Cancellation,
        sink: &dyn EventSink,
    ) -> Result<()> {
        driver::acquire(&self.file, &self.path, &region, mode, cancellation, sink)?;
        match self.held.iter_mut().find(|(r, _)| *r == region) {
            Some(entry) => entry.1 = mode,
            None => self.held.push((region, mode)),
        }
        Ok(())
    }

    /// Acquire each `(region, mode)` in order.
    ///
    /// If any step fails, the regions this call newly acquired or upgraded
    /// are released before the error is returned.
    pub fn acquire_all(
        &mut self,
        steps: &[(LockRegion, LockMode)],
        cancellation: &Cancellation,
        sink: &dyn EventSink,
    ) -> Result<()> {
        let mut taken = Vec::with_capacity(steps.len());
        for &(region, mode) in steps {
            if let Err(e) = self.acquire(region, mode, cancellation, sink) {
                for region in taken.iter().rev() {
                    // The original error is the one worth reporting.
                    let _ = self.release(region, sink);
                }
                return Err(e);
            }
            taken.push(region);
        }
        Ok(())
    }

    /// Release `region`. Releasing a region that is not held succeeds.
    pub fn release(&mut self, region: &LockRegion, sink: &dyn EventSink) -> Result<()> {
        driver::release(&self.file, &self.path, region, sink)?;
        self.held.retain(|(r, _)| r != region);
        Ok(())
    }

    /// Close the handle, releasing all of its locks, and surface any close error.
    pub fn close(self, sink: &dyn EventSink) -> Result<()> {
        let LockSession { file, path, .. } = self;
        nix::unistd::close(file.into_raw_fd())
            .map_err(|e| RestoreError::io(format!("close '{}'", path.display()), e.into()))?;
        sink.emit(Event::new(EventAction::Close).with_target(&path));
        Ok(())
    }
}
