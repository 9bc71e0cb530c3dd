//! Byte-range lock regions shared with every process that opens the database.
//!
//! These offsets are a compatibility contract with the database engine. Any
//! change makes this tool invisible to (or corrupting for) other processes.

/// Which file a region lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The main database file.
    Database,
    /// The `-shm` shared-index file used in WAL mode.
    Index,
}

/// A named byte range used for advisory locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockRegion {
    pub name: &'static str,
    pub scope: Scope,
    pub start: u64,
    pub len: u64,
}

/// First byte of the lock page, past the end of any page data.
pub const PENDING_BYTE: u64 = 0x4000_0000;
pub const RESERVED_BYTE: u64 = PENDING_BYTE + 1;
pub const SHARED_FIRST: u64 = PENDING_BYTE + 2;
/// Number of reader slots covered by the shared range.
pub const SHARED_SIZE: u64 = 510;

/// First lock byte in the shared-index file.
pub const INDEX_LOCK_BASE: u64 = 120;

pub const PENDING: LockRegion = LockRegion::database("PENDING", PENDING_BYTE, 1);
pub const RESERVED: LockRegion = LockRegion::database("RESERVED", RESERVED_BYTE, 1);
pub const SHARED: LockRegion = LockRegion::database("SHARED", SHARED_FIRST, SHARED_SIZE);

pub const WRITE: LockRegion = LockRegion::index("WRITE", INDEX_LOCK_BASE);
pub const CKPT: LockRegion = LockRegion::index("CKPT", INDEX_LOCK_BASE + 1);
pub const RECOVER: LockRegion = LockRegion::index("RECOVER", INDEX_LOCK_BASE + 2);
pub const READ0: LockRegion = LockRegion::index("READ0", INDEX_LOCK_BASE + 3);
pub const READ1: LockRegion = LockRegion::index("READ1", INDEX_LOCK_BASE + 4);
pub const READ2: LockRegion = LockRegion::index("READ2", INDEX_LOCK_BASE + 5);
pub const READ3: LockRegion = LockRegion::index("READ3", INDEX_LOCK_BASE + 6);
pub const READ4: LockRegion = LockRegion::index("READ4", INDEX_LOCK_BASE + 7);
pub const DMS: LockRegion = LockRegion::index("DMS", INDEX_LOCK_BASE + 8);

/// Regions locked on the main database file.
pub const DATABASE_REGIONS: [LockRegion; 3] = [PENDING, RESERVED, SHARED];

/// Regions locked on the shared-index file.
pub const INDEX_REGIONS: [LockRegion; 9] = [
    WRITE, CKPT, RECOVER, READ0, READ1, READ2, READ3, READ4, DMS,
];

impl LockRegion {
    const fn database(name: &'static str, start: u64, len: u64) -> Self {
        Self {
            name,
            scope: Scope::Database,
            start,
            len,
        }
    }

    const fn index(name: &'static str, start: u64) -> Self {
        Self {
            name,
            scope: Scope::Index,
            start,
            len: 1,
        }
    }

    /// Look a region up by name across both catalogs, ignoring case.
    pub fn by_name(name: &str) -> Option<LockRegion> {
        DATABASE_REGIONS
            .iter()
            .chain(INDEX_REGIONS.iter())
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .copied()
    }

}

impl std::fmt::Display for LockRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
