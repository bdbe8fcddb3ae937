//! C ABI for NEMU/Spike-style difftest harnesses.
//!
//! A harness `dlopen`s the shared library and calls the `difftest_*`
//! symbols below. They operate on one process-wide session created by
//! [`difftest_init`]; the reference core is supplied separately through
//! [`difftest_attach_core`].
//!
//! Directions follow the usual convention: `false` is `DIFFTEST_TO_DUT`,
//! `true` is `DIFFTEST_TO_REF`.
//!
//! # Safety
//! Pointer arguments must be valid for the sizes given (or null, which is
//! reported and ignored). Recoverable errors are logged and the call becomes
//! a no-op; only a failed RAM allocation in `difftest_init` terminates the
//! process.

use std::ffi::{c_int, c_void};
use std::slice;
use std::sync::{Mutex, MutexGuard};

use crate::arena::{DEFAULT_RAM_SIZE, RAM_IMAGE_OFFSET};
use crate::session::DifftestSession;
use crate::state::DutContext;
use crate::stepper::{ForeignCore, MiniRv32StepFn};
use crate::sync::Direction;

static SESSION: Mutex<Option<DifftestSession<ForeignCore>>> = Mutex::new(None);
// Core registered before or after init; new sessions start from it.
static CORE: Mutex<ForeignCore> = Mutex::new(ForeignCore::detached());

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_session<R>(op: &str, f: impl FnOnce(&mut DifftestSession<ForeignCore>) -> R) -> Option<R> {
    let mut guard = lock(&SESSION);
    match guard.as_mut() {
        Some(session) => Some(f(session)),
        None => {
            log::error!("{}: difftest_init has not been called", op);
            None
        }
    }
}

/// Allocate reference RAM and reset the reference state.
///
/// `port` is accepted for API compatibility and otherwise ignored. Calling
/// this again discards the previous session.
#[unsafe(no_mangle)]
pub extern "C" fn difftest_init(port: c_int) {
    let _ = env_logger::try_init();

    let core = *lock(&CORE);
    match DifftestSession::new(core) {
        Ok(session) => {
            log::info!(
                "difftest_init(port={}): core {}",
                port,
                if core.is_attached() { "attached" } else { "not attached yet" }
            );
            log::debug!(
                "attached core must be built for image offset {:#010x}, RAM size {:#x}",
                RAM_IMAGE_OFFSET,
                DEFAULT_RAM_SIZE
            );
            *lock(&SESSION) = Some(session);
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("[rv32-difftest] {}", e);
            std::process::exit(1);
        }
    }
}

/// Register the reference core's step function.
///
/// # Safety
/// `step` must follow the [`ForeignCore::new`] contract for the session
/// `difftest_init` creates: compiled with `MINIRV32_RAM_IMAGE_OFFSET` equal
/// to [`RAM_IMAGE_OFFSET`] and `MINI_RV32_RAM_SIZE` equal to
/// [`DEFAULT_RAM_SIZE`]. A null pointer detaches the core.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn difftest_attach_core(step: Option<MiniRv32StepFn>) {
    let core = match step {
        // SAFETY: contract forwarded to the caller.
        Some(step) => unsafe { ForeignCore::new(step) },
        None => ForeignCore::detached(),
    };
    *lock(&CORE) = core;
    if let Some(session) = lock(&SESSION).as_mut() {
        *session.core_mut() = core;
    }
}

/// Copy `n` bytes at `buf` into reference RAM at `addr`.
///
/// # Safety
/// `buf` must be readable for `n` bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn difftest_memcpy(addr: u32, buf: *mut c_void, n: usize, direction: bool) {
    let direction = Direction::from_raw(direction);
    let data: &[u8] = if n == 0 {
        &[]
    } else if buf.is_null() {
        log::error!("difftest_memcpy: null buffer for {} bytes at {:#010x}", n, addr);
        return;
    } else {
        // SAFETY: non-null and readable for `n` bytes per the caller contract.
        unsafe { slice::from_raw_parts(buf as *const u8, n) }
    };

    let result = with_session("difftest_memcpy", |s| s.copy_memory(addr, data, direction));
    if let Some(Err(e)) = result {
        log::error!("difftest_memcpy(addr={:#010x}, n={}): {}", addr, n, e);
    }
}

/// Copy the register set between the DUT context at `dut` and the reference.
///
/// # Safety
/// `dut` must point to a valid, exclusively borrowed [`DutContext`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn difftest_regcpy(dut: *mut c_void, direction: bool) {
    if dut.is_null() {
        log::error!("difftest_regcpy: null context");
        return;
    }
    // SAFETY: non-null and pointing to a DutContext per the caller contract.
    let ctx = unsafe { &mut *(dut as *mut DutContext) };
    with_session("difftest_regcpy", |s| {
        s.copy_registers(ctx, Direction::from_raw(direction))
    });
}

/// Execute `n` instructions on the reference core.
#[unsafe(no_mangle)]
pub extern "C" fn difftest_exec(n: u64) {
    if let Some(Err(e)) = with_session("difftest_exec", |s| s.step(n)) {
        log::error!("difftest_exec({}): {}", n, e);
    }
}

/// Enter a trap with cause `no` on the reference side.
#[unsafe(no_mangle)]
pub extern "C" fn difftest_raise_intr(no: u64) {
    with_session("difftest_raise_intr", |s| s.raise_interrupt(no));
}

/// Read back the word at `waddr` into `*wdata`; 0 if `waddr` is out of range.
///
/// # Safety
/// `wdata` must be writable (or null, in which case nothing is written).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn difftest_store(waddr: u32, wdata: *mut u32) {
    if wdata.is_null() {
        log::error!("difftest_store: null output pointer");
        return;
    }
    let value = match with_session("difftest_store", |s| s.read_store_result(waddr)) {
        Some(Ok(value)) => value,
        Some(Err(e)) => {
            log::error!("difftest_store: {}", e);
            0
        }
        None => 0,
    };
    // SAFETY: non-null and writable per the caller contract.
    unsafe { wdata.write(value) };
}

/// Print the reference word at `addr` on stdout.
#[unsafe(no_mangle)]
pub extern "C" fn difftest_mem(addr: u32) {
    match with_session("difftest_mem", |s| s.dump_memory(addr)) {
        Some(Ok(word)) => println!("{}", word),
        Some(Err(e)) => log::error!("difftest_mem: {}", e),
        None => {}
    }
}
