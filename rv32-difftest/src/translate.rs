//! DUT address to arena offset translation.

use crate::error::MemoryError;

/// Map an absolute DUT address onto an offset into an arena of `size` bytes
/// starting at `base`.
///
/// The access `[addr, addr + len)` must lie entirely inside
/// `[base, base + size)`. Addresses below `base` are rejected rather than
/// wrapped to a huge offset, and the end computation cannot overflow.
#[inline]
pub fn translate(addr: u32, base: u32, size: usize, len: usize) -> Result<usize, MemoryError> {
    let out_of_bounds = || MemoryError::OutOfBounds {
        addr,
        len,
        base,
        end: base as u64 + size as u64,
    };

    let offset = addr.checked_sub(base).ok_or_else(out_of_bounds)? as usize;
    let end = offset.checked_add(len).ok_or_else(out_of_bounds)?;
    if end > size {
        return Err(out_of_bounds());
    }
    Ok(offset)
}
