use thiserror::Error;

/// Arena access errors.
///
/// `end` is the exclusive upper bound of the arena, so the valid window for
/// any access is `[base, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("Out-of-bounds access at {addr:#010x} (len {len}), valid range [{base:#010x} : {end:#010x}]")]
    OutOfBounds {
        addr: u32,
        len: usize,
        base: u32,
        end: u64,
    },

    #[error("Failed to allocate {0} bytes of reference RAM")]
    Allocation(usize),
}

/// Snapshot validation and codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    #[error("snapshot RAM base mismatch: session={session:#x}, snapshot={snapshot:#x}")]
    BaseMismatch { session: u32, snapshot: u32 },

    #[error("snapshot RAM size mismatch: session={session} bytes, snapshot={snapshot} bytes")]
    SizeMismatch { session: usize, snapshot: usize },

    #[error("snapshot RAM records {declared} bytes but carries {actual}")]
    DeclaredSizeMismatch { declared: u64, actual: usize },

    #[error("snapshot RAM hash mismatch for base {0:#x}")]
    HashMismatch(u32),

    #[error("snapshot memory region has no inline data")]
    MissingData,

    #[error("snapshot codec error: {0}")]
    Codec(String),
}

/// Errors surfaced by a difftest session.
///
/// None of these are fatal: the failing operation leaves the reference state
/// and arena as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DifftestError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("memory copy towards the DUT is not supported")]
    UnsupportedDirection,

    #[error("reference core step failed with code {code}")]
    StepFailed { code: i32 },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
