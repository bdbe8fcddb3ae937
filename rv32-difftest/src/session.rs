//! Difftest session: the reference model's state, its RAM, and its core.
//!
//! A session is created once per comparison run and threaded through every
//! call. It owns everything the reference side needs, so several sessions
//! can coexist (one per DUT under test, or a scratch one in unit tests).

use crate::arena::{DEFAULT_RAM_SIZE, MemoryArena, RAM_IMAGE_OFFSET};
use crate::error::{DifftestError, SnapshotError};
use crate::inspect::{self, MemoryWord};
use crate::snapshot::{MemRegionSnapshot, SNAPSHOT_VERSION, Snapshot};
use crate::state::{DutContext, ReferenceState};
use crate::stepper::ReferenceCore;
use crate::sync::{self, Direction};

/// Arena placement for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Address of the first arena byte; also the reset `pc`.
    pub base: u32,
    /// Arena size in bytes.
    pub size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base: RAM_IMAGE_OFFSET,
            size: DEFAULT_RAM_SIZE,
        }
    }
}

pub struct DifftestSession<C: ReferenceCore> {
    state: ReferenceState,
    arena: MemoryArena,
    core: C,
}

impl<C: ReferenceCore> DifftestSession<C> {
    /// Create a session with the default 128 MiB arena at `0x8000_0000`.
    pub fn new(core: C) -> Result<Self, DifftestError> {
        Self::with_config(SessionConfig::default(), core)
    }

    /// Allocate a zeroed arena and reset the reference state: `pc` at the
    /// arena base, machine mode, everything else zero.
    pub fn with_config(config: SessionConfig, core: C) -> Result<Self, DifftestError> {
        let arena = MemoryArena::new(config.base, config.size)?;
        let state = ReferenceState::new(config.base);
        log::info!(
            "Reference session initialized with {}MB RAM at {:#010x}",
            config.size / (1024 * 1024),
            config.base
        );
        Ok(Self { state, arena, core })
    }

    pub fn state(&self) -> &ReferenceState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ReferenceState {
        &mut self.state
    }

    pub fn arena(&self) -> &MemoryArena {
        &self.arena
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    /// Seed reference memory from the DUT.
    ///
    /// Only [`Direction::ToReference`] is supported: reference memory is read
    /// back through the inspector, never wholesale.
    pub fn copy_memory(
        &mut self,
        addr: u32,
        buf: &[u8],
        direction: Direction,
    ) -> Result<(), DifftestError> {
        match direction {
            Direction::ToReference => {
                self.arena.write_bytes(addr, buf)?;
                Ok(())
            }
            Direction::ToDut => Err(DifftestError::UnsupportedDirection),
        }
    }

    /// Zero `len` bytes of reference memory starting at `addr` (BSS fill).
    pub fn zero_memory(&mut self, addr: u32, len: usize) -> Result<(), DifftestError> {
        self.arena.zero_range(addr, len)?;
        Ok(())
    }

    /// Copy the architectural register set between `ctx` and the reference.
    pub fn copy_registers(&mut self, ctx: &mut DutContext, direction: Direction) {
        sync::sync_registers(&mut self.state, ctx, direction);
    }

    /// Run the reference core for `count` instructions.
    ///
    /// The core counts in `i32`, so large requests are issued in chunks;
    /// the first non-zero return stops the run and is reported.
    pub fn step(&mut self, count: u64) -> Result<(), DifftestError> {
        let mut remaining = count;
        while remaining > 0 {
            let chunk = remaining.min(i32::MAX as u64);
            let code = self
                .core
                .step(&mut self.state, self.arena.as_mut_slice(), chunk as i32);
            if code != 0 {
                return Err(DifftestError::StepFailed { code });
            }
            remaining -= chunk;
        }
        Ok(())
    }

    /// Mirror an interrupt the DUT has taken. See
    /// [`ReferenceState::enter_trap`].
    pub fn raise_interrupt(&mut self, cause: u64) {
        self.state.enter_trap(cause);
    }

    /// Word at `addr` as the reference sees it after a store.
    pub fn read_store_result(&self, addr: u32) -> Result<u32, DifftestError> {
        Ok(inspect::read_word(&self.arena, addr)?.value)
    }

    pub fn dump_memory(&self, addr: u32) -> Result<MemoryWord, DifftestError> {
        let word = inspect::read_word(&self.arena, addr)?;
        log::debug!("{}", word);
        Ok(word)
    }

    /// Capture the reference state and RAM.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            state: self.state,
            memory: MemRegionSnapshot::capture(self.arena.base(), self.arena.as_slice()),
        }
    }

    /// Restore a snapshot taken from a session with the same arena layout.
    ///
    /// All checks happen before anything is written, so a rejected snapshot
    /// leaves the session unchanged.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), DifftestError> {
        let data = snapshot.verified_memory()?;

        if snapshot.memory.base != self.arena.base() {
            return Err(SnapshotError::BaseMismatch {
                session: self.arena.base(),
                snapshot: snapshot.memory.base,
            }
            .into());
        }
        if data.len() != self.arena.size() {
            return Err(SnapshotError::SizeMismatch {
                session: self.arena.size(),
                snapshot: data.len(),
            }
            .into());
        }

        self.arena.set_data(data)?;
        self.state = snapshot.state;
        log::debug!(
            "Restored snapshot: pc={:#010x}, {} bytes of RAM",
            self.state.pc,
            data.len()
        );
        Ok(())
    }
}
