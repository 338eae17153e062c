//! Bit layout of the 64-bit lock word.
//!
//! The word is addressed two ways: as one 64-bit quantity `W` (used by the
//! reader-counter path, which needs atomicity across both halves), or as two
//! 32-bit halves, the *state* half `S` (where futex waits happen) and the
//! *counters* half `C`. See the module-level docs on [`crate::WrfLock`] for
//! the endianness rationale.

// --- state half (S), bit positions local to the 32-bit half ---

pub(crate) const CURR_W: u32 = 1 << 0;
pub(crate) const CURR_R: u32 = 1 << 1;
pub(crate) const CURR_F: u32 = 1 << 2;
pub(crate) const CURR_MASK: u32 = CURR_W | CURR_R | CURR_F;

pub(crate) const NEXT_W: u32 = 1 << 4;
pub(crate) const NEXT_RF: u32 = 1 << 5;
pub(crate) const NEXT_MASK: u32 = NEXT_W | NEXT_RF;

pub(crate) const YIELD_W: u32 = 1 << 16;
pub(crate) const YIELD_R: u32 = 1 << 17;
pub(crate) const YIELD_F: u32 = 1 << 18;
pub(crate) const YIELD_MASK: u32 = YIELD_W | YIELD_R | YIELD_F;

pub(crate) const RD_NEXT_LOOP: u32 = 1 << 25;
pub(crate) const PSHARED: u32 = 1 << 26;

pub(crate) const ACQ_W: u32 = 1 << 28;
pub(crate) const ACQ_R: u32 = 1 << 29;
pub(crate) const ACQ_F: u32 = 1 << 30;

// --- counters half (C) ---

pub(crate) const RD_COUNT_SHIFT: u32 = 0;
pub(crate) const RD_COUNT_MASK: u32 = 0xFFFF;
pub(crate) const RD_COUNT_MAX: u32 = RD_COUNT_MASK;
pub(crate) const RD_COUNT_ONE: u32 = 1 << RD_COUNT_SHIFT;

/// Bit offset of the state half `S` within the full 64-bit word `W`.
///
/// On little-endian targets `S` is the upper 32 bits of `W` and `C` the
/// lower; on big-endian the roles invert. See `spec.md` §3/§9 for why: the
/// two halves are laid out at fixed, platform-independent byte offsets
/// within the word (counters first, state second, see [`crate::raw::Halves`]),
/// and it is the machine's native byte order that then decides which of
/// those offsets ends up holding the numerically "upper" half.
#[cfg(target_endian = "little")]
pub(crate) const SHIFT_S: u32 = 32;
#[cfg(target_endian = "big")]
pub(crate) const SHIFT_S: u32 = 0;

pub(crate) const SHIFT_C: u32 = 32 - SHIFT_S;

/// Widens a 32-bit state-half mask to its position in the full word.
pub(crate) const fn s_mask64(mask: u32) -> u64 {
    (mask as u64) << SHIFT_S
}

/// Widens a 32-bit counters-half mask to its position in the full word.
pub(crate) const fn c_mask64(mask: u32) -> u64 {
    (mask as u64) << SHIFT_C
}

/// Extracts the state half from a full-word value.
pub(crate) const fn s_of(w: u64) -> u32 {
    (w >> SHIFT_S) as u32
}

/// Extracts the counters half from a full-word value.
pub(crate) const fn c_of(w: u64) -> u32 {
    (w >> SHIFT_C) as u32
}

/// Reassembles a full-word value from its two halves.
pub(crate) const fn pack(s: u32, c: u32) -> u64 {
    s_mask64(s) | c_mask64(c)
}

pub(crate) const READER_INC: u64 = c_mask64(RD_COUNT_ONE);

/// A closed set of recognized wait-strategy flags (spec.md §6.2).
///
/// `*Yield` wins over `*Block` when both are supplied for the same phase,
/// matching the "yield wins over block" rule.
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct WaitFlags: u32 {
        const WRITE_BLOCK = 0;
        const WRITE_YIELD = YIELD_W;
        const READ_BLOCK = 0;
        const READ_YIELD = YIELD_R;
        const FREE_BLOCK = 0;
        const FREE_YIELD = YIELD_F;
    }
}

impl WaitFlags {
    /// Maps the flag set onto the three `YIELD_*` bits of the state half.
    pub(crate) const fn to_state_bits(self) -> u32 {
        self.bits() & YIELD_MASK
    }
}
