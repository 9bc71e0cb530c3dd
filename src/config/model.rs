//! Config struct definition and default implementation.

use serde::Deserialize;
use std::path::PathBuf;

/// Settings for a restore run.
///
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Lock settings
    // =========================================================================
    /// How long to wait for other processes to release their locks, in
    /// milliseconds (0 waits forever).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    // =========================================================================
    // Diagnostics
    // =========================================================================
    /// Print each step to stderr.
    #[serde(default)]
    pub verbose: bool,

    /// Append each step as a JSON line to this file.
    #[serde(default)]
    pub events_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            verbose: false,
            events_file: None,
        }
    }
}

pub(crate) fn default_timeout_ms() -> u64 {
    5000
}
