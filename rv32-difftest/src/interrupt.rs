//! Trap entry performed outside the reference core's step function.
//!
//! When the DUT takes an interrupt the reference core has no way of knowing
//! about it, so the bridge reproduces the side effects of a machine-mode trap
//! entry directly on the reference state. Returning from the trap is left to
//! the core executing MRET.

use crate::state::{
    EXTRAFLAGS_PRIV_MASK, MSTATUS_MIE, MSTATUS_MPIE, MSTATUS_MPP_SHIFT, Privilege,
    ReferenceState,
};

impl ReferenceState {
    /// Enter a machine-mode trap with `cause`.
    ///
    /// The new mstatus carries only MPIE (from MIE) and MPP (from the current
    /// privilege); every other status bit, MIE included, reads as zero. There
    /// is no delegation and no vectored dispatch: `pc` always lands on `mtvec`.
    pub fn enter_trap(&mut self, cause: u64) {
        let pc = self.pc;

        self.mcause = cause as u32;
        self.mtval = 0;
        self.mepc = pc;

        let mpie = if self.mstatus & MSTATUS_MIE != 0 { MSTATUS_MPIE } else { 0 };
        let mpp = self.extraflags & EXTRAFLAGS_PRIV_MASK;
        let mstatus_before = self.mstatus;
        self.mstatus = mpie | (mpp << MSTATUS_MPP_SHIFT);

        self.pc = self.mtvec;
        self.extraflags |= Privilege::Machine.to_bits();

        if log::log_enabled!(log::Level::Trace) {
            log::trace!(
                "Injected trap cause={:#x}: mepc={:#010x} mstatus {:#010x} -> {:#010x}, pc -> {:#010x}",
                cause,
                pc,
                mstatus_before,
                self.mstatus,
                self.pc
            );
        }
    }
}
