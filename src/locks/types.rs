//! Lock mode definitions.

/// Requested hold on a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Read lock: compatible with other shared holders.
    Shared,
    /// Write lock: excludes every other holder.
    Exclusive,
    /// Remove whatever this process holds on the range.
    Unlock,
}

impl LockMode {
    /// The `fcntl` lock type for this mode.
    pub fn as_raw(&self) -> libc::c_short {
        let raw = match self {
            LockMode::Shared => libc::F_RDLCK,
            LockMode::Exclusive => libc::F_WRLCK,
            LockMode::Unlock => libc::F_UNLCK,
        };
        raw as libc::c_short
    }

    /// Short name used in diagnostics, mirroring the `fcntl` constants.
    pub fn as_str(&self) -> &'static str {
        match self {
            LockMode::Shared => "RDLCK",
            LockMode::Exclusive => "WRLCK",
            LockMode::Unlock => "UNLCK",
        }
    }
}

impl std::fmt::Display for LockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
