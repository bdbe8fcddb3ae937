//! Read-only views into the reference arena for mismatch triage.

use std::fmt;

use crate::arena::MemoryArena;
use crate::error::MemoryError;

/// One 32-bit word of reference memory together with where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryWord {
    pub addr: u32,
    pub offset: usize,
    pub value: u32,
}

impl fmt::Display for MemoryWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(ref) addr = {:#010x}, offset = {:#010x}, mem = {:#010x}",
            self.addr, self.offset, self.value
        )
    }
}

/// Read the little-endian word at `addr`.
pub fn read_word(arena: &MemoryArena, addr: u32) -> Result<MemoryWord, MemoryError> {
    let offset = arena.translate(addr, 4)?;
    let value = arena.load_32(addr)?;
    Ok(MemoryWord { addr, offset, value })
}
