//! Register file transfer between the DUT context and the reference state.

use crate::state::{DutContext, ReferenceState};

/// Direction of a state or memory transfer.
///
/// Over the C ABI this is a `bool`: `false` is towards the DUT, `true`
/// towards the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToDut,
    ToReference,
}

impl Direction {
    pub const fn from_raw(to_reference: bool) -> Self {
        if to_reference {
            Direction::ToReference
        } else {
            Direction::ToDut
        }
    }
}

impl ReferenceState {
    /// Overwrite the synchronised subset from the DUT.
    ///
    /// Only the privilege bits of `extraflags` are taken from `ctx.prv`;
    /// the WFI and reservation bits stay with the reference core.
    pub fn load_from_dut(&mut self, ctx: &DutContext) {
        self.regs = ctx.gpr;
        self.pc = ctx.pc;
        self.mepc = ctx.mepc;
        self.mcause = ctx.mcause;
        self.mtvec = ctx.mtvec;
        self.mstatus = ctx.mstatus;
        self.mie = ctx.mie;
        self.mscratch = ctx.mscratch;
        self.mtval = ctx.mtval;
        self.mip = ctx.mip;
        self.set_privilege_bits(ctx.prv);
    }

    /// Exact inverse of [`load_from_dut`](Self::load_from_dut). `ctx.wdata`
    /// is left alone.
    pub fn store_to_dut(&self, ctx: &mut DutContext) {
        ctx.gpr = self.regs;
        ctx.pc = self.pc;
        ctx.mepc = self.mepc;
        ctx.mcause = self.mcause;
        ctx.mtvec = self.mtvec;
        ctx.mstatus = self.mstatus;
        ctx.mie = self.mie;
        ctx.mscratch = self.mscratch;
        ctx.mtval = self.mtval;
        ctx.mip = self.mip;
        ctx.prv = self.privilege_bits();
    }
}

/// Copy registers in `direction`.
pub fn sync_registers(state: &mut ReferenceState, ctx: &mut DutContext, direction: Direction) {
    match direction {
        Direction::ToReference => state.load_from_dut(ctx),
        Direction::ToDut => state.store_to_dut(ctx),
    }
    if log::log_enabled!(log::Level::Trace) {
        log::trace!(
            "regcpy {:?}: pc={:#010x} prv={} mstatus={:#010x}",
            direction,
            state.pc,
            state.privilege_bits(),
            state.mstatus
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> DutContext {
        let mut gpr = [0u32; 32];
        for (i, r) in gpr.iter_mut().enumerate() {
            *r = 0x1111_0000 | (i as u32 * 0x0101);
        }
        DutContext {
            prv: 1,
            gpr,
            pc: 0x8000_0040,
            mepc: 0x8000_0100,
            mcause: 0x8000_0007,
            mtvec: 0x8000_0200,
            mstatus: 0x0000_1888,
            mie: 0x888,
            mscratch: 0xcafe_f00d,
            mtval: 0x1234,
            mip: 0x80,
            wdata: 0,
        }
    }

    #[test]
    fn test_round_trip_reproduces_context() {
        let original = sample_context();
        let mut state = ReferenceState::new(0);

        let mut input = original;
        sync_registers(&mut state, &mut input, Direction::ToReference);

        let mut fresh = DutContext::default();
        sync_registers(&mut state, &mut fresh, Direction::ToDut);

        assert_eq!(fresh, original);
    }

    #[test]
    fn test_to_reference_field_mapping() {
        let ctx = sample_context();
        let mut state = ReferenceState::new(0);
        state.load_from_dut(&ctx);

        assert_eq!(state.regs, ctx.gpr);
        assert_eq!(state.pc, ctx.pc);
        assert_eq!(state.mepc, ctx.mepc);
        assert_eq!(state.mcause, ctx.mcause);
        assert_eq!(state.mtvec, ctx.mtvec);
        assert_eq!(state.mstatus, ctx.mstatus);
        assert_eq!(state.mie, ctx.mie);
        assert_eq!(state.mscratch, ctx.mscratch);
        assert_eq!(state.mtval, ctx.mtval);
        assert_eq!(state.mip, ctx.mip);
        assert_eq!(state.privilege_bits(), 1);
    }

    #[test]
    fn test_to_reference_keeps_core_private_fields() {
        let mut state = ReferenceState::new(0);
        state.extraflags = 0x0000_00f7; // reservation + WFI + machine
        state.cyclel = 42;
        state.timermatchh = 7;

        let ctx = DutContext { prv: 0, ..sample_context() };
        state.load_from_dut(&ctx);

        assert_eq!(state.extraflags, 0x0000_00f4);
        assert_eq!(state.cyclel, 42);
        assert_eq!(state.timermatchh, 7);
    }

    #[test]
    fn test_to_reference_masks_prv() {
        let mut state = ReferenceState::new(0);
        let ctx = DutContext { prv: 0xffff_fffc | 0b01, ..DutContext::default() };
        state.load_from_dut(&ctx);
        assert_eq!(state.extraflags, 0b01);
    }

    #[test]
    fn test_to_dut_leaves_wdata() {
        let mut state = ReferenceState::new(0x8000_0000);
        state.regs[5] = 0xdead_beef;

        let mut ctx = DutContext { wdata: 0x5555_aaaa, prv: 0, ..DutContext::default() };
        sync_registers(&mut state, &mut ctx, Direction::ToDut);

        assert_eq!(ctx.wdata, 0x5555_aaaa);
        assert_eq!(ctx.gpr[5], 0xdead_beef);
        assert_eq!(ctx.pc, 0x8000_0000);
        assert_eq!(ctx.prv, 3);
    }

    #[test]
    fn test_x0_copied_verbatim() {
        let mut ctx = DutContext::default();
        ctx.gpr[0] = 0xffff_ffff;
        let mut state = ReferenceState::new(0);
        state.load_from_dut(&ctx);
        assert_eq!(state.regs[0], 0xffff_ffff);
    }

    #[test]
    fn test_direction_from_raw() {
        assert_eq!(Direction::from_raw(true), Direction::ToReference);
        assert_eq!(Direction::from_raw(false), Direction::ToDut);
    }
}
