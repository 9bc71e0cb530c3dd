//! Locking subsystem for sqlite3-restore.
//!
//! This module reproduces the database engine's advisory locking protocol so
//! that "exclusive access" taken here looks, to every other process, exactly
//! like exclusive access taken by the engine itself.
//!
//! # Regions
//!
//! Locks are POSIX record locks on fixed byte ranges:
//! - Rollback-journal mode: `PENDING`, `RESERVED`, `SHARED` at the 1 GiB
//!   lock page of the database file
//! - WAL mode: `WRITE`, `CKPT`, `RECOVER`, `READ0`..`READ4`, `DMS` in the
//!   `-shm` file
//!
//! # Waiting
//!
//! Attempts are non-blocking. Contention is retried every 10 ms until the
//! caller's [`Cancellation`] deadline passes or it is cancelled.
//!
//! # Sessions
//!
//! A [`LockSession`] owns one handle and tracks what is held through it, so
//! release is symmetric with acquisition. Closing the handle releases
//! everything.

pub mod driver;
pub mod policy;
pub mod region;
mod session;
mod types;


// Re-export public API
pub use policy::{Attempt, Cancellation, Decision, POLL_INTERVAL, RetryPolicy};
pub use region::{LockRegion, Scope};
pub use session::LockSession;
pub use types::LockMode;
