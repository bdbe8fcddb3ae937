//! Seam to the reference core's instruction stepper.
//!
//! The bridge never decodes instructions itself. A [`ReferenceCore`] is
//! handed the state record and the arena bytes and runs them forward; the
//! usual implementation is [`ForeignCore`], which calls a C step function
//! with the mini-rv32ima signature.

use crate::state::ReferenceState;

/// Return code of a foreign core that has no step function attached.
pub const DETACHED_CORE_CODE: i32 = -1;

/// `MiniRV32IMAStep(state, image, vProcAddress, elapsedUs, count)`.
pub type MiniRv32StepFn = unsafe extern "C" fn(
    state: *mut ReferenceState,
    image: *mut u8,
    vproc_address: u32,
    elapsed_us: u32,
    count: i32,
) -> i32;

/// An instruction-level reference model.
pub trait ReferenceCore {
    /// Execute `count` instructions against `state` and `ram`.
    ///
    /// `ram[0]` corresponds to the arena base address. Returns 0 on success;
    /// any other value is a core-specific failure code.
    fn step(&mut self, state: &mut ReferenceState, ram: &mut [u8], count: i32) -> i32;
}

impl<C: ReferenceCore + ?Sized> ReferenceCore for Box<C> {
    fn step(&mut self, state: &mut ReferenceState, ram: &mut [u8], count: i32) -> i32 {
        (**self).step(state, ram, count)
    }
}

/// Adapter over an externally linked C step function.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForeignCore {
    step_fn: Option<MiniRv32StepFn>,
}

impl ForeignCore {
    /// Wrap `step_fn`.
    ///
    /// # Safety
    /// `step_fn` must only touch the state record it is given and at most
    /// the arena size of the session it is used with. The C core resolves
    /// guest addresses against its own compiled layout, so the session it
    /// steps must use exactly that layout:
    ///
    /// - the session's arena base equals the core's `MINIRV32_RAM_IMAGE_OFFSET`;
    /// - the session's arena size equals the core's `MINI_RV32_RAM_SIZE`.
    ///
    /// With a different base the core indexes `ram` at offsets outside the
    /// arena.
    pub unsafe fn new(step_fn: MiniRv32StepFn) -> Self {
        Self { step_fn: Some(step_fn) }
    }

    /// A core that fails every step until a function is attached.
    pub const fn detached() -> Self {
        Self { step_fn: None }
    }

    /// Replace the step function.
    ///
    /// # Safety
    /// Same contract as [`ForeignCore::new`].
    pub unsafe fn attach(&mut self, step_fn: MiniRv32StepFn) {
        self.step_fn = Some(step_fn);
    }

    pub fn is_attached(&self) -> bool {
        self.step_fn.is_some()
    }
}

impl ReferenceCore for ForeignCore {
    fn step(&mut self, state: &mut ReferenceState, ram: &mut [u8], count: i32) -> i32 {
        let Some(step_fn) = self.step_fn else {
            log::warn!("step requested but no reference core is attached");
            return DETACHED_CORE_CODE;
        };
        // SAFETY: both pointers come from live exclusive borrows, and the
        // size contract was accepted when the function was attached.
        unsafe { step_fn(state as *mut ReferenceState, ram.as_mut_ptr(), 0, 0, count) }
    }
}
