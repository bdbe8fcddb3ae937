//! Differential-testing bridge between a DUT CPU and a reference RV32 core.
//!
//! The bridge keeps the reference model's machine-mode state and RAM
//! convertible to and from the DUT's view: register sync in both directions,
//! memory seeding, stepping through an external core, trap injection, and
//! inspection of reference memory. Comparing the two sides is up to the
//! harness.

pub mod arena;
pub mod error;
pub mod ffi;
pub mod inspect;
pub mod interrupt;
pub mod loader;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod stepper;
pub mod sync;
pub mod translate;

pub use arena::{DEFAULT_RAM_SIZE, MemoryArena, RAM_IMAGE_OFFSET};
pub use error::{DifftestError, MemoryError, SnapshotError};
pub use inspect::MemoryWord;
pub use session::{DifftestSession, SessionConfig};
pub use snapshot::Snapshot;
pub use state::{DutContext, Privilege, ReferenceState};
pub use stepper::{ForeignCore, ReferenceCore};
pub use sync::Direction;
