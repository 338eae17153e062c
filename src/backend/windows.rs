//! Windows backend: `WaitOnAddress` / `WakeByAddressSingle` / `WakeByAddressAll`.

use core::ffi::c_void;
use core::sync::atomic::AtomicU32;
use core::time::Duration;

use windows_sys::Win32::Foundation::{GetLastError, ERROR_TIMEOUT};
use windows_sys::Win32::System::Threading::{
    WaitOnAddress, WakeByAddressAll, WakeByAddressSingle, INFINITE,
};

#[inline]
pub(super) fn wait(addr: &AtomicU32, expected: u32, timeout: Option<Duration>) -> bool {
    let timeout_ms: u32 = match timeout {
        None => INFINITE,
        Some(d) => u32::try_from(d.as_millis()).unwrap_or(u32::MAX),
    };

    let expected = expected;
    let ok = unsafe {
        WaitOnAddress(
            addr as *const AtomicU32 as *const c_void,
            &expected as *const u32 as *const c_void,
            core::mem::size_of::<u32>(),
            timeout_ms,
        )
    };

    if ok != 0 {
        return true;
    }

    let err = unsafe { GetLastError() };
    if err != ERROR_TIMEOUT {
        log::trace!("wrflock: WaitOnAddress failed with error {err}");
    }
    false
}

#[inline]
pub(super) fn wake_one(addr: &AtomicU32) {
    unsafe {
        WakeByAddressSingle(addr as *const AtomicU32 as *const c_void);
    }
}

#[inline]
pub(super) fn wake_all(addr: &AtomicU32) {
    unsafe {
        WakeByAddressAll(addr as *const AtomicU32 as *const c_void);
    }
}
