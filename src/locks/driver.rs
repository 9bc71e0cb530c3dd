//! POSIX record-lock driver.
//!
//! Each request is a single non-blocking `fcntl(F_SETLK)` on the region's
//! exact byte range. Contention is handled by polling (see
//! [`super::policy`]), never by `F_SETLKW`: other processes may drop and
//! retake locks in steps a blocking wait would miss, and the deadline has to
//! be honored to the poll interval.
//!
//! POSIX locks belong to the process, not the descriptor. Two handles in the
//! same process never conflict, and closing any handle to an inode drops
//! every lock the process holds on it.

use super::policy::{Attempt, Cancellation, Decision, RetryPolicy};
use super::region::LockRegion;
use super::types::LockMode;
use crate::error::{RestoreError, Result};
use crate::events::{Event, EventAction, EventSink};
use nix::errno::Errno;
use nix::fcntl::{FcntlArg, fcntl};
use serde_json::json;
use std::fs::File;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::time::Instant;

fn flock_for(region: &LockRegion, mode: LockMode) -> libc::flock {
    libc::flock {
        l_type: mode.as_raw(),
        l_whence: libc::SEEK_SET as libc::c_short,
        l_start: region.start as libc::off_t,
        l_len: region.len as libc::off_t,
        l_pid: 0,
    }
}

/// Make one non-blocking attempt to set `mode` on `region`.
///
/// Returns `Ok(true)` if the lock was set, `Ok(false)` if another process
/// holds a conflicting lock, and `Err` for real I/O errors.
pub fn try_lock(file: &File, region: &LockRegion, mode: LockMode) -> Result<bool> {
    let flock = flock_for(region, mode);
    match fcntl(file.as_raw_fd(), FcntlArg::F_SETLK(&flock)) {
        Ok(_) => Ok(true),
        Err(Errno::EACCES | Errno::EAGAIN | Errno::EINTR) => Ok(false),
        Err(e) => Err(RestoreError::io(
            format!("fcntl {} {}", mode, region),
            e.into(),
        )),
    }
}

/// Pid of a process holding a lock that conflicts with `mode` on `region`.
///
/// Best effort: the holder may release between the failed attempt and this
/// query, and some filesystems do not report pids.
pub fn holder_pid(file: &File, region: &LockRegion, mode: LockMode) -> Option<i32> {
    let mut flock = flock_for(region, mode);
    fcntl(file.as_raw_fd(), FcntlArg::F_GETLK(&mut flock)).ok()?;
    if flock.l_type == LockMode::Unlock.as_raw() || flock.l_pid <= 0 {
        return None;
    }
    Some(flock.l_pid)
}

/// Acquire `mode` on `region`, polling until granted or `cancellation` fires.
pub fn acquire(
    file: &File,
    path: &Path,
    region: &LockRegion,
    mode: LockMode,
    cancellation: &Cancellation,
    sink: &dyn EventSink,
) -> Result<()> {
    acquire_with(
        file,
        path,
        region,
        mode,
        &RetryPolicy::default(),
        cancellation,
        sink,
    )
}

/// [`acquire`] with an explicit retry policy.
pub fn acquire_with(
    file: &File,
    path: &Path,
    region: &LockRegion,
    mode: LockMode,
    policy: &RetryPolicy,
    cancellation: &Cancellation,
    sink: &dyn EventSink,
) -> Result<()> {
    let mut holder = None;
    loop {
        let attempt = if try_lock(file, region, mode)? {
            Attempt::Granted
        } else {
            holder = holder_pid(file, region, mode).or(holder);
            Attempt::Conflict
        };

        match policy.decide(attempt, Instant::now(), cancellation) {
            Decision::Done => {
                sink.emit(
                    Event::new(EventAction::LockAcquired)
                        .with_target(path)
                        .with_details(json!({
                            "region": region.name,
                            "mode": mode.as_str(),
                            "start": region.start,
                            "len": region.len,
                        })),
                );
                return Ok(());
            }
            Decision::Retry(wait) => {
                sink.emit(
                    Event::new(EventAction::LockWait)
                        .with_target(path)
                        .with_details(json!({
                            "region": region.name,
                            "mode": mode.as_str(),
                            "holder_pid": holder,
                        })),
                );
                std::thread::sleep(wait);
            }
            Decision::TimedOut => {
                return Err(RestoreError::LockTimeout {
                    region: region.name,
                    holder_pid: holder,
                });
            }
            Decision::Cancelled => {
                return Err(RestoreError::LockCancelled {
                    region: region.name,
                });
            }
        }
    }
}

/// Drop whatever this process holds on `region`. Releasing an unheld region succeeds.
pub fn release(file: &File, path: &Path, region: &LockRegion, sink: &dyn EventSink) -> Result<()> {
    // F_UNLCK never conflicts, so a false return would mean a kernel bug.
    try_lock(file, region, LockMode::Unlock)?;
    sink.emit(
        Event::new(EventAction::LockReleased)
            .with_target(path)
            .with_details(json!({ "region": region.name })),
    );
    Ok(())
}
