//! Handles opened during a restore, closed in a fixed order on every exit path.

use crate::error::{RestoreError, Result};
use crate::events::{Event, EventAction, EventSink};
use crate::locks::LockSession;
use std::fs::File;
use std::os::fd::IntoRawFd;
use std::path::{Path, PathBuf};

/// Everything a restore has opened so far.
///
/// `index` is only ever set in WAL mode.
#[derive(Debug, Default)]
pub(super) struct OpenHandles {
    pub source: Option<(File, PathBuf)>,
    pub destination: Option<LockSession>,
    pub index: Option<LockSession>,
}

impl OpenHandles {
    /// Close source, destination, then index.
    ///
    /// Every handle is closed even if an earlier close fails; the first
    /// failure is returned. Closing a locked handle releases its locks.
    pub fn close(self, sink: &dyn EventSink) -> Result<()> {
        let mut first_err = None;

        if let Some((file, path)) = self.source {
            record(&mut first_err, close_file(file, &path, sink));
        }
        if let Some(session) = self.destination {
            record(&mut first_err, session.close(sink));
        }
        if let Some(session) = self.index {
            record(&mut first_err, session.close(sink));
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn record(first_err: &mut Option<RestoreError>, result: Result<()>) {
    if let Err(e) = result
        && first_err.is_none()
    {
        *first_err = Some(e);
    }
}

fn close_file(file: File, path: &Path, sink: &dyn EventSink) -> Result<()> {
    nix::unistd::close(file.into_raw_fd())
        .map_err(|e| RestoreError::io(format!("close '{}'", path.display()), e.into()))?;
    sink.emit(Event::new(EventAction::Close).with_target(path));
    Ok(())
}
