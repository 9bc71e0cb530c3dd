//! Lock-guarded, in-place database restore.
//!
//! A restore takes the same locks the database engine would take to write,
//! so every cooperating process either finishes before it or waits until it
//! is done, and then overwrites the destination through its existing inode.
//!
//! # Sequence
//!
//! 1. Open the destination read/write (created empty if missing)
//! 2. Probe: shared `PENDING`, shared `SHARED`, release `PENDING`, read the
//!    header to pick the [`Mode`]
//! 3. Upgrade:
//!    - rollback: exclusive `RESERVED`, `PENDING`, `SHARED`
//!    - WAL: open `-shm`, shared `DMS`, exclusive `WRITE`, `CKPT`,
//!      `RECOVER`, `READ0`..`READ4`
//! 4. Remove `-journal`
//! 5. Truncate `-wal` (WAL only)
//! 6. Copy source over destination, truncate to size, sync
//! 7. Zero the `-shm` header (WAL only)
//! 8. Sync the parent directory
//! 9. Close source, destination, `-shm`, which releases every lock
//!
//! Step 9 runs on every exit path for whatever was opened.
//!
//! # Known limitation
//!
//! The copy is not atomic. If the process or machine dies during step 6 the
//! destination holds part old and part new content, and the side files that
//! could have recovered the old content are already gone.

mod handles;
mod task;


pub use task::{DEFAULT_TIMEOUT, RestoreReport, RestoreTask};

use crate::context::{DatabasePaths, ensure_distinct};
use crate::error::{RestoreError, Result};
use crate::events::{Event, EventAction, EventSink};
use crate::fs::{
    INDEX_HEADER_SIZE, copy_contents, invalidate_index, remove_if_exists, sync_dir,
    truncate_if_exists,
};
use crate::locks::region::{
    CKPT, DMS, PENDING, READ0, READ1, READ2, READ3, READ4, RECOVER, RESERVED, SHARED, WRITE,
};
use crate::locks::{Cancellation, LockMode, LockRegion, LockSession};
use crate::mode::{self, Mode};
use handles::OpenHandles;
use serde_json::json;
use std::fs::File;

/// Locks taken on the database file to read the header.
const PROBE_LOCKS: [(LockRegion, LockMode); 2] =
    [(PENDING, LockMode::Shared), (SHARED, LockMode::Shared)];

/// Engine order for reaching an exclusive lock in rollback-journal mode.
const ROLLBACK_UPGRADE: [(LockRegion, LockMode); 3] = [
    (RESERVED, LockMode::Exclusive),
    (PENDING, LockMode::Exclusive),
    (SHARED, LockMode::Exclusive),
];

/// Index-file locks for WAL mode. Writer, checkpointer, and recovery are
/// taken before the reader slots so no new reader attaches mid-upgrade.
const WAL_UPGRADE: [(LockRegion, LockMode); 9] = [
    (DMS, LockMode::Shared),
    (WRITE, LockMode::Exclusive),
    (CKPT, LockMode::Exclusive),
    (RECOVER, LockMode::Exclusive),
    (READ0, LockMode::Exclusive),
    (READ1, LockMode::Exclusive),
    (READ2, LockMode::Exclusive),
    (READ3, LockMode::Exclusive),
    (READ4, LockMode::Exclusive),
];

/// Replace the destination's contents with the source's.
///
/// Every handle opened along the way is closed before this returns, whether
/// or not the restore succeeded.
pub fn restore(
    task: &RestoreTask,
    cancellation: &Cancellation,
    sink: &dyn EventSink,
) -> Result<RestoreReport> {
    let paths = DatabasePaths::new(&task.destination);
    let mut handles = OpenHandles::default();

    let result = run(task, &paths, cancellation, sink, &mut handles);
    let closed = handles.close(sink);

    match result.and_then(|report| closed.map(|()| report)) {
        Ok(report) => {
            sink.emit(
                Event::new(EventAction::Restored)
                    .with_target(&paths.db)
                    .with_details(json!({
                        "mode": report.mode.as_str(),
                        "bytes": report.bytes_copied,
                    })),
            );
            Ok(report)
        }
        Err(e) => {
            sink.emit(
                Event::new(EventAction::Failed)
                    .with_target(&paths.db)
                    .with_details(json!({ "error": e.to_string() })),
            );
            Err(e)
        }
    }
}

fn run(
    task: &RestoreTask,
    paths: &DatabasePaths,
    cancellation: &Cancellation,
    sink: &dyn EventSink,
    handles: &mut OpenHandles,
) -> Result<RestoreReport> {
    ensure_distinct(&task.source, &paths.db)?;

    let db = handles
        .destination
        .insert(LockSession::open(&paths.db, sink)?);
    let mode = probe_mode(db, cancellation, sink)?;

    match mode {
        Mode::Rollback => db.acquire_all(&ROLLBACK_UPGRADE, cancellation, sink)?,
        Mode::WriteAheadLog => {
            let index = handles
                .index
                .insert(LockSession::open(&paths.shm, sink)?);
            index.acquire_all(&WAL_UPGRADE, cancellation, sink)?;
        }
    }

    let removed = remove_if_exists(&paths.journal)?;
    sink.emit(
        Event::new(EventAction::RemoveJournal)
            .with_target(&paths.journal)
            .with_details(json!({ "existed": removed })),
    );

    if mode.is_wal() {
        let truncated = truncate_if_exists(&paths.wal)?;
        sink.emit(
            Event::new(EventAction::TruncateWal)
                .with_target(&paths.wal)
                .with_details(json!({ "existed": truncated })),
        );
    }

    let source = File::open(&task.source).map_err(|e| {
        RestoreError::io(
            format!("open source '{}'", task.source.display()),
            e,
        )
    })?;
    sink.emit(Event::new(EventAction::Open).with_target(&task.source));
    let (source, _) = handles.source.insert((source, task.source.clone()));

    let bytes_copied = copy_contents(source, db.file())?;
    sink.emit(
        Event::new(EventAction::Copy)
            .with_target(&paths.db)
            .with_details(json!({ "bytes": bytes_copied })),
    );

    if let Some(index) = &handles.index {
        invalidate_index(index.file())?;
        sink.emit(
            Event::new(EventAction::InvalidateIndex)
                .with_target(index.path())
                .with_details(json!({ "bytes": INDEX_HEADER_SIZE })),
        );
    }

    sync_dir(&paths.parent_dir)?;
    sink.emit(Event::new(EventAction::SyncDirectory).with_target(&paths.parent_dir));

    Ok(RestoreReport { mode, bytes_copied })
}

/// Classify the destination while holding only a shared `SHARED` lock.
///
/// Shared `PENDING` is taken first, as the engine's readers do, so we queue
/// behind a writer that is already escalating. It is released before
/// returning so no later exclusive request contends with it.
fn probe_mode(
    db: &mut LockSession,
    cancellation: &Cancellation,
    sink: &dyn EventSink,
) -> Result<Mode> {
    db.acquire_all(&PROBE_LOCKS, cancellation, sink)?;
    db.release(&PENDING, sink)?;

    let mode = mode::detect(db.file())?;
    sink.emit(
        Event::new(EventAction::ModeDetected)
            .with_target(db.path())
            .with_details(json!({ "mode": mode.as_str() })),
    );
    Ok(mode)
}
