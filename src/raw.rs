//! Raw 8-byte lock word: one `AtomicU64` overlaid on two `AtomicU32` halves.
//!
//! This is the same trick the `qrwlock` lineage uses for its single 32-bit
//! word (`RawRwlock`/`RawRwLockBits`), widened to 64 bits per spec.md §3/§9:
//! counters and state live in different 32-bit halves of one atomic word,
//! but the reader-release path occasionally needs to touch both at once.

use core::mem::ManuallyDrop;
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::bits::{self, pack};

#[repr(C)]
pub(crate) struct Halves {
    /// Declared first unconditionally; which numeric half this ends up being
    /// (upper or lower 32 bits of the 64-bit value) depends on the target's
    /// native byte order, not on any `cfg` here, see `bits::SHIFT_S`.
    counters: ManuallyDrop<AtomicU32>,
    state: ManuallyDrop<AtomicU32>,
}

#[repr(C)]
pub(crate) union RawWord {
    whole: ManuallyDrop<AtomicU64>,
    halves: ManuallyDrop<Halves>,
}

static_assertions::const_assert_eq!(core::mem::size_of::<RawWord>(), core::mem::size_of::<u64>());
static_assertions::const_assert_eq!(core::mem::align_of::<RawWord>(), core::mem::align_of::<u64>());

impl RawWord {
    pub(crate) fn new(initial: u64) -> Self {
        Self {
            whole: ManuallyDrop::new(AtomicU64::new(initial)),
        }
    }

    #[inline(always)]
    pub(crate) fn whole(&self) -> &AtomicU64 {
        unsafe { &self.whole }
    }

    /// Address of the state half `S`, the only address ever passed to the
    /// wait backend.
    #[inline(always)]
    pub(crate) fn state_atomic(&self) -> &AtomicU32 {
        unsafe { &self.halves.state }
    }

    #[inline(always)]
    pub(crate) fn counters_atomic(&self) -> &AtomicU32 {
        unsafe { &self.halves.counters }
    }

    #[inline(always)]
    pub(crate) fn load_s(&self, order: Ordering) -> u32 {
        self.state_atomic().load(order)
    }

    #[inline(always)]
    pub(crate) fn cas_s(
        &self,
        current: u32,
        new: u32,
        success: Ordering,
        failure: Ordering,
    ) -> Result<u32, u32> {
        self.state_atomic()
            .compare_exchange(current, new, success, failure)
    }

    #[inline(always)]
    pub(crate) fn load_w(&self, order: Ordering) -> u64 {
        self.whole().load(order)
    }

    #[inline(always)]
    pub(crate) fn cas_w(
        &self,
        current: u64,
        new: u64,
        success: Ordering,
        failure: Ordering,
    ) -> Result<u64, u64> {
        self.whole().compare_exchange(current, new, success, failure)
    }
}

/// Builds the initial word for a freshly created lock: `NEXT_W` set, the
/// caller's yield flags and `pshared` marker applied, everything else zero.
pub(crate) fn initial_word(yield_bits: u32, pshared: bool) -> u64 {
    let mut s = bits::NEXT_W | (yield_bits & bits::YIELD_MASK);
    if pshared {
        s |= bits::PSHARED;
    }
    pack(s, 0)
}

unsafe impl Send for RawWord {}
unsafe impl Sync for RawWord {}
