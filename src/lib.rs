//! sqlite3-restore: replace a live database file in place.
//!
//! The destination is overwritten through its existing inode while holding
//! the same POSIX byte-range locks the database engine uses, so processes
//! that keep the file open see either the old contents or the new ones.
//! See [`restore::restore`] for the full sequence.

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod exit_codes;
pub mod fs;
pub mod locks;
pub mod mode;
pub mod restore;

#[cfg(test)]
mod test_support;
