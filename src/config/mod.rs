//! Configuration model for sqlite3-restore.
//!
//! Defines the optional `Config` YAML file passed with `--config`. Parsing is
//! forward-compatible (unknown fields are ignored), missing fields take
//! defaults, and command-line flags override whatever the file sets.

mod model;
mod operations;


// Re-export public API
pub use model::Config;
