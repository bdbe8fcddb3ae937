//! Architectural state records on both sides of the bridge.

use serde::{Deserialize, Serialize};

/// mstatus.MIE
pub const MSTATUS_MIE: u32 = 1 << 3;
/// mstatus.MPIE
pub const MSTATUS_MPIE: u32 = 1 << 7;
/// Bit position of the two-bit mstatus.MPP field.
pub const MSTATUS_MPP_SHIFT: u32 = 11;

/// Privilege level bits inside `ReferenceState::extraflags`.
pub const EXTRAFLAGS_PRIV_MASK: u32 = 0b11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Privilege {
    User,
    Supervisor,
    Machine,
}

impl Privilege {
    /// Encode into the two-bit MPP / extraflags encoding.
    pub fn to_bits(self) -> u32 {
        match self {
            Privilege::User => 0b00,
            Privilege::Supervisor => 0b01,
            Privilege::Machine => 0b11,
        }
    }

    /// Decode a two-bit privilege field.
    pub fn from_bits(bits: u32) -> Privilege {
        match bits & 0b11 {
            0b00 => Privilege::User,
            0b01 => Privilege::Supervisor,
            // 0b10 is reserved; treat as Machine for WARL coercion.
            _ => Privilege::Machine,
        }
    }
}

/// Reference core register and CSR file.
///
/// The layout matches the reference core's own state record field for field,
/// so a foreign step function can work on it in place. Only the machine-mode
/// subset is synchronised with the DUT; the cycle and timer words belong to
/// the core.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceState {
    pub regs: [u32; 32],
    pub pc: u32,
    pub mstatus: u32,
    pub cyclel: u32,
    pub cycleh: u32,
    pub timerl: u32,
    pub timerh: u32,
    pub timermatchl: u32,
    pub timermatchh: u32,
    pub mscratch: u32,
    pub mtvec: u32,
    pub mie: u32,
    pub mip: u32,
    pub mepc: u32,
    pub mtval: u32,
    pub mcause: u32,
    /// Bits 0..1: privilege. Bit 2: WFI. Bits 3+: LR/SC reservation.
    pub extraflags: u32,
}

impl ReferenceState {
    /// Zeroed state in machine mode with `pc` at the image load address.
    pub fn new(reset_pc: u32) -> Self {
        Self {
            pc: reset_pc,
            extraflags: Privilege::Machine.to_bits(),
            ..Self::default()
        }
    }

    /// Raw two-bit privilege field.
    #[inline]
    pub fn privilege_bits(&self) -> u32 {
        self.extraflags & EXTRAFLAGS_PRIV_MASK
    }

    pub fn privilege(&self) -> Privilege {
        Privilege::from_bits(self.privilege_bits())
    }

    /// Replace the privilege bits, keeping every other extraflags bit.
    #[inline]
    pub fn set_privilege_bits(&mut self, bits: u32) {
        self.extraflags = (self.extraflags & !EXTRAFLAGS_PRIV_MASK) | (bits & EXTRAFLAGS_PRIV_MASK);
    }

    pub fn set_privilege(&mut self, mode: Privilege) {
        self.set_privilege_bits(mode.to_bits());
    }
}

/// DUT-side mirror of the machine-mode state, owned by the caller.
///
/// Field order is fixed because the host harness passes this structure
/// across the C ABI.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DutContext {
    pub prv: u32,
    pub gpr: [u32; 32],
    pub pc: u32,

    pub mepc: u32,
    pub mcause: u32,
    pub mtvec: u32,
    pub mstatus: u32,

    pub mie: u32,
    pub mscratch: u32,
    pub mtval: u32,
    pub mip: u32,

    /// Data of the DUT's last store, compared against `read_store_result`.
    pub wdata: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privilege_encoding() {
        assert_eq!(Privilege::User.to_bits(), 0);
        assert_eq!(Privilege::Supervisor.to_bits(), 1);
        assert_eq!(Privilege::Machine.to_bits(), 3);
        assert_eq!(Privilege::from_bits(0b10), Privilege::Machine);
        assert_eq!(Privilege::from_bits(0b111), Privilege::Machine);
        assert_eq!(Privilege::from_bits(0b100), Privilege::User);
    }

    #[test]
    fn test_reset_state() {
        let state = ReferenceState::new(0x8000_0000);
        assert_eq!(state.pc, 0x8000_0000);
        assert_eq!(state.privilege(), Privilege::Machine);
        assert_eq!(state.regs, [0; 32]);
        assert_eq!(state.mstatus, 0);
    }

    #[test]
    fn test_set_privilege_preserves_upper_flags() {
        let mut state = ReferenceState::new(0);
        state.extraflags = 0xabcd_0007;
        state.set_privilege(Privilege::User);
        assert_eq!(state.extraflags, 0xabcd_0004);
        state.set_privilege_bits(0xffff_fffd);
        assert_eq!(state.extraflags, 0xabcd_0005);
    }

    #[test]
    fn test_reference_state_layout() {
        // 32 GPRs followed by 17 words of pc/CSR/timer/flags state.
        assert_eq!(std::mem::size_of::<ReferenceState>(), (32 + 17) * 4);
        assert_eq!(std::mem::align_of::<ReferenceState>(), 4);
    }

    #[test]
    fn test_dut_context_layout() {
        // prv, 32 GPRs, pc, 8 CSRs, wdata.
        assert_eq!(std::mem::size_of::<DutContext>(), (1 + 32 + 1 + 8 + 1) * 4);
    }
}
