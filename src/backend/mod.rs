//! Address-based wait backend (component B, spec.md §6.1).
//!
//! The state machine in [`crate::core_state`] consumes only this minimal
//! interface; it never calls into `futex`, `__ulock_wait`, or
//! `WaitOnAddress` directly. `timeout_ms == 0` means "wait forever".

use core::sync::atomic::AtomicU32;
use core::time::Duration;

#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux;
#[cfg(any(target_os = "macos", target_os = "ios"))]
mod macos;
#[cfg(windows)]
mod windows;

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "macos",
    target_os = "ios",
    windows
)))]
compile_error!("wrflock: no address-based wait backend for this target");

/// Parks the calling thread while `*addr == expected`, for up to
/// `timeout_ms` milliseconds (`0` meaning no limit).
///
/// Returns `true` if the thread was woken (spuriously or not); `false` on
/// timeout or backend error. The caller is always expected to recheck the
/// condition it waited on, per spec.md §5 ("spurious wakeups").
#[inline]
pub(crate) fn wait(addr: &AtomicU32, expected: u32, timeout_ms: u64) -> bool {
    let timeout = if timeout_ms == 0 {
        None
    } else {
        Some(Duration::from_millis(timeout_ms))
    };

    #[cfg(any(target_os = "linux", target_os = "android"))]
    return linux::wait(addr, expected, timeout);

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    return macos::wait(addr, expected, timeout);

    #[cfg(windows)]
    return windows::wait(addr, expected, timeout);
}

/// Wakes a single thread parked on `addr`.
#[inline]
pub(crate) fn wake_one(addr: &AtomicU32) {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    return linux::wake_one(addr);

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    return macos::wake_one(addr);

    #[cfg(windows)]
    return windows::wake_one(addr);
}

/// Wakes every thread parked on `addr`.
#[inline]
pub(crate) fn wake_all(addr: &AtomicU32) {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    return linux::wake_all(addr);

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    return macos::wake_all(addr);

    #[cfg(windows)]
    return windows::wake_all(addr);
}
