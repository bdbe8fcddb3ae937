use crate::error::MemoryError;
use crate::translate::translate;

/// Physical address at which the reference core expects its RAM image.
pub const RAM_IMAGE_OFFSET: u32 = 0x8000_0000;

/// Default reference RAM size (128 MiB).
pub const DEFAULT_RAM_SIZE: usize = 0x0800_0000;

/// Zero-initialised byte store backing the reference core's physical memory.
///
/// Unlike a raw buffer, every accessor here takes an **absolute DUT address**
/// and funnels it through [`translate`], so an out-of-range access is
/// rejected before any byte is touched. The arena never grows or shrinks
/// after creation.
pub struct MemoryArena {
    base: u32,
    data: Vec<u8>,
}

impl MemoryArena {
    /// Allocate a zeroed arena of `size` bytes mapped at `base`.
    ///
    /// Allocation is fallible so the caller decides whether running out of
    /// memory terminates the process.
    pub fn new(base: u32, size: usize) -> Result<Self, MemoryError> {
        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| MemoryError::Allocation(size))?;
        data.resize(size, 0);
        Ok(Self { base, data })
    }

    #[inline(always)]
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Get the size of the arena in bytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Exclusive end of the mapped window.
    pub fn end(&self) -> u64 {
        self.base as u64 + self.data.len() as u64
    }

    /// Validate `[addr, addr + len)` and return its offset into the arena.
    #[inline]
    pub fn translate(&self, addr: u32, len: usize) -> Result<usize, MemoryError> {
        translate(addr, self.base, self.data.len(), len)
    }

    /// Write an arbitrary slice into the arena starting at `addr`.
    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<(), MemoryError> {
        let off = self.translate(addr, data.len())?;
        self.data[off..off + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Borrow `len` bytes starting at `addr`.
    pub fn read_bytes(&self, addr: u32, len: usize) -> Result<&[u8], MemoryError> {
        let off = self.translate(addr, len)?;
        Ok(&self.data[off..off + len])
    }

    /// Zero `len` bytes starting at `addr` (BSS fill).
    pub fn zero_range(&mut self, addr: u32, len: usize) -> Result<(), MemoryError> {
        let off = self.translate(addr, len)?;
        self.data[off..off + len].fill(0);
        Ok(())
    }

    /// Little-endian 32-bit read. Alignment is not required.
    pub fn load_32(&self, addr: u32) -> Result<u32, MemoryError> {
        let bytes = self.read_bytes(addr, 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn load_8(&self, addr: u32) -> Result<u8, MemoryError> {
        Ok(self.read_bytes(addr, 1)?[0])
    }

    /// Whole arena, offset 0 corresponding to `base`.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Whole arena for the reference core's step function, which addresses
    /// it by offset from `base` itself.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Replace all arena contents (for snapshot restore).
    pub fn set_data(&mut self, data: &[u8]) -> Result<(), MemoryError> {
        if data.len() != self.data.len() {
            return Err(MemoryError::OutOfBounds {
                addr: self.base,
                len: data.len(),
                base: self.base,
                end: self.end(),
            });
        }
        self.data.copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_arena() -> MemoryArena {
        MemoryArena::new(RAM_IMAGE_OFFSET, 64 * 1024).unwrap()
    }

    #[test]
    fn test_new_is_zeroed() {
        let arena = make_arena();
        assert_eq!(arena.size(), 64 * 1024);
        assert_eq!(arena.base(), RAM_IMAGE_OFFSET);
        assert_eq!(arena.end(), RAM_IMAGE_OFFSET as u64 + 64 * 1024);
        assert!(arena.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_then_load() {
        let mut arena = make_arena();
        arena
            .write_bytes(RAM_IMAGE_OFFSET + 0x100, &[0xef, 0xbe, 0xad, 0xde])
            .unwrap();
        assert_eq!(arena.load_32(RAM_IMAGE_OFFSET + 0x100).unwrap(), 0xdead_beef);
        assert_eq!(arena.load_8(RAM_IMAGE_OFFSET + 0x103).unwrap(), 0xde);
        // Unaligned word straddling the write.
        assert_eq!(arena.load_32(RAM_IMAGE_OFFSET + 0x102).unwrap(), 0x0000_dead);
    }

    #[test]
    fn test_rejected_write_leaves_arena_untouched() {
        let mut arena = make_arena();
        let end = RAM_IMAGE_OFFSET + arena.size() as u32;

        assert!(arena.write_bytes(RAM_IMAGE_OFFSET - 1, &[1, 2]).is_err());
        assert!(arena.write_bytes(end - 1, &[1, 2]).is_err());
        assert!(arena.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_range() {
        let mut arena = make_arena();
        arena.write_bytes(RAM_IMAGE_OFFSET, &[0xff; 16]).unwrap();
        arena.zero_range(RAM_IMAGE_OFFSET + 4, 8).unwrap();
        assert_eq!(arena.read_bytes(RAM_IMAGE_OFFSET, 4).unwrap(), &[0xff; 4]);
        assert_eq!(arena.read_bytes(RAM_IMAGE_OFFSET + 4, 8).unwrap(), &[0; 8]);
        assert_eq!(arena.read_bytes(RAM_IMAGE_OFFSET + 12, 4).unwrap(), &[0xff; 4]);
    }

    #[test]
    fn test_set_data_requires_exact_size() {
        let mut arena = MemoryArena::new(RAM_IMAGE_OFFSET, 8).unwrap();
        assert!(arena.set_data(&[1; 4]).is_err());
        arena.set_data(&[7; 8]).unwrap();
        assert_eq!(arena.as_slice(), &[7; 8]);
    }

    #[test]
    fn test_allocation_failure_is_reported() {
        let err = MemoryArena::new(RAM_IMAGE_OFFSET, usize::MAX).err();
        assert_eq!(err, Some(MemoryError::Allocation(usize::MAX)));
    }
}
