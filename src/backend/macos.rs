//! macOS/iOS backend: Darwin's private `__ulock_wait`/`__ulock_wake`.
//!
//! `libc` does not expose these (they are not a stable public API), so the
//! symbols are declared here directly, the same way low-level parking
//! libraries in the wild reach past `libc` for platform primitives it
//! doesn't cover.

use core::ffi::c_void;
use core::sync::atomic::AtomicU32;
use core::time::Duration;

const UL_COMPARE_AND_WAIT: u32 = 1;
const ULF_WAKE_ALL: u32 = 0x0000_0100;
const ULF_NO_ERRNO: u32 = 0x0100_0000;

extern "C" {
    fn __ulock_wait(operation: u32, addr: *mut c_void, value: u64, timeout_us: u32) -> i32;
    fn __ulock_wake(operation: u32, addr: *mut c_void, wake_value: u64) -> i32;
}

#[inline]
pub(super) fn wait(addr: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool {
    let timeout_us: u32 = match timeout {
        None => 0,
        Some(d) => u32::try_from(d.as_micros()).unwrap_or(u32::MAX).max(1),
    };

    let rc = unsafe {
        __ulock_wait(
            UL_COMPARE_AND_WAIT | ULF_NO_ERRNO,
            addr as *const AtomicU32 as *mut c_void,
            expected as u64,
            timeout_us,
        )
    };

    match rc {
        // Negated errno on failure (ULF_NO_ERRNO): -ETIMEDOUT on expiry.
        r if r >= 0 => true,
        r if -r == libc::ETIMEDOUT => false,
        // EINTR, or the expected value no longer matching: recheck.
        r if -r == libc::EINTR || -r == libc::EAGAIN => true,
        r => {
            log::trace!("wrflock: __ulock_wait failed with errno {}", -r);
            true
        }
    }
}

#[inline]
pub(super) fn wake_one(addr: &AtomicU32) {
    unsafe {
        __ulock_wake(UL_COMPARE_AND_WAIT, addr as *const AtomicU32 as *mut c_void, 0);
    }
}

#[inline]
pub(super) fn wake_all(addr: &AtomicU32) {
    unsafe {
        __ulock_wake(
            UL_COMPARE_AND_WAIT | ULF_WAKE_ALL,
            addr as *const AtomicU32 as *mut c_void,
            0,
        );
    }
}
