//! Binary and ELF loading utilities.
//!
//! Seeds reference RAM with the same program image the DUT boots from. Segment
//! bytes go through [`DifftestSession::copy_memory`] and BSS through
//! [`DifftestSession::zero_memory`], after every segment has been checked
//! against the arena.

use goblin::elf::{Elf, program_header::PT_LOAD};
use thiserror::Error;

use crate::error::DifftestError;
use crate::session::DifftestSession;
use crate::stepper::ReferenceCore;
use crate::sync::Direction;

const ELF_MAGIC: &[u8; 4] = b"\x7FELF";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("ELF parse error: {0}")]
    Parse(#[from] goblin::error::Error),

    #[error("ELF segment exceeds file bounds (offset {0:#x})")]
    SegmentOutOfFile(u64),

    #[error("ELF segment at {0:#x} does not fit a 32-bit address space")]
    SegmentAddress(u64),

    #[error("Failed to load segment: {0}")]
    Memory(#[from] DifftestError),
}

/// Load an ELF or raw image into the session's arena.
///
/// Returns the entry point: the ELF entry, or the arena base for a raw image.
pub fn load_image<C: ReferenceCore>(
    session: &mut DifftestSession<C>,
    image: &[u8],
) -> Result<u32, LoadError> {
    if image.starts_with(ELF_MAGIC) {
        load_elf(session, image)
    } else {
        let base = session.arena().base();
        session.copy_memory(base, image, Direction::ToReference)?;
        log::debug!("Raw image loaded: {} bytes at {:#010x}", image.len(), base);
        Ok(base)
    }
}

fn load_elf<C: ReferenceCore>(
    session: &mut DifftestSession<C>,
    buffer: &[u8],
) -> Result<u32, LoadError> {
    let elf = Elf::parse(buffer)?;
    let entry = u32::try_from(elf.entry).map_err(|_| LoadError::SegmentAddress(elf.entry))?;

    // Validate every segment before touching the arena so a rejected image
    // leaves reference RAM as it was.
    let mut segments = Vec::new();
    for ph in &elf.program_headers {
        if ph.p_type != PT_LOAD || ph.p_memsz == 0 {
            continue;
        }

        let file_size = ph.p_filesz as usize;
        let mem_size = ph.p_memsz as usize;
        let file_offset = ph.p_offset as usize;

        let file_end = file_offset
            .checked_add(file_size)
            .filter(|&end| end <= buffer.len())
            .ok_or(LoadError::SegmentOutOfFile(ph.p_offset))?;

        let target = if ph.p_paddr != 0 { ph.p_paddr } else { ph.p_vaddr };
        let target_addr = u32::try_from(target).map_err(|_| LoadError::SegmentAddress(target))?;

        session
            .arena()
            .translate(target_addr, mem_size.max(file_size))
            .map_err(DifftestError::from)?;

        segments.push((target_addr, file_offset..file_end, mem_size));
    }

    for (target_addr, file_range, mem_size) in segments {
        let file_size = file_range.len();
        if file_size > 0 {
            session.copy_memory(target_addr, &buffer[file_range], Direction::ToReference)?;
        }
        if mem_size > file_size {
            // In range: the whole segment was translated above.
            session.zero_memory(target_addr + file_size as u32, mem_size - file_size)?;
        }
    }

    log::debug!(
        "ELF loaded: entry={:#010x}, segments={}",
        entry,
        elf.program_headers.len()
    );
    Ok(entry)
}
