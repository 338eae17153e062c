//! Linux futex backend: `FUTEX_WAIT_PRIVATE` / `FUTEX_WAKE_PRIVATE`.
//!
//! Grounded on the raw `libc::syscall(SYS_futex, ...)` pattern used by the
//! write-preferring rwlock in the retrieval pack, generalized to carry a
//! real timeout (`timespec`) instead of a null one.

use core::sync::atomic::AtomicU32;
use core::time::Duration;

#[inline]
pub(super) fn wait(addr: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool {
    let ts = timeout.map(|d| libc::timespec {
        tv_sec: d.as_secs() as libc::time_t,
        tv_nsec: d.subsec_nanos() as libc::c_long,
    });
    let ts_ptr = ts
        .as_ref()
        .map_or(core::ptr::null(), |t| t as *const libc::timespec);

    let rc = unsafe {
        libc::syscall(
            libc::SYS_futex,
            addr as *const AtomicU32 as *const u32,
            libc::FUTEX_WAIT_PRIVATE,
            expected,
            ts_ptr,
        )
    };

    if rc == 0 {
        return true;
    }

    let errno = unsafe { *libc::__errno_location() };
    match errno {
        // Value had already changed: treat like a spontaneous wakeup, the
        // caller rechecks the condition regardless.
        libc::EAGAIN => true,
        libc::ETIMEDOUT => false,
        libc::EINTR => true,
        other => {
            log::trace!("wrflock: futex wait failed with errno {other}");
            false
        }
    }
}

#[inline]
pub(super) fn wake_one(addr: &AtomicU32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            addr as *const AtomicU32 as *const u32,
            libc::FUTEX_WAKE_PRIVATE,
            1i32,
        );
    }
}

#[inline]
pub(super) fn wake_all(addr: &AtomicU32) {
    unsafe {
        libc::syscall(
            libc::SYS_futex,
            addr as *const AtomicU32 as *const u32,
            libc::FUTEX_WAKE_PRIVATE,
            i32::MAX,
        );
    }
}
