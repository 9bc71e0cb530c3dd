//! Inputs and outputs of one restore run.

use crate::locks::Cancellation;
use crate::mode::Mode;
use std::path::PathBuf;
use std::time::Duration;

/// Default time to wait for other processes to release their locks.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// One restore: copy `source` over `destination`, waiting at most `timeout`
/// for locks. `None` waits forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreTask {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub timeout: Option<Duration>,
}

impl RestoreTask {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Set the lock timeout. A zero duration disables it.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    /// A cancellation token whose deadline starts now.
    pub fn cancellation(&self) -> Cancellation {
        match self.timeout {
            Some(timeout) => Cancellation::with_timeout(timeout),
            None => Cancellation::none(),
        }
    }
}

/// Summary of a successful restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    pub mode: Mode,
    pub bytes_copied: u64,
}
