//! The state-machine core (component C, spec.md §4.C), the entire
//! engineering contribution of this crate. Every mutating operation reads
//! the word relaxed, computes the new value as a pure function of the old
//! one, and CASes; on failure it rereads and retries. Wait-free per step,
//! bounded only by contention, exactly like the fast/slow split the
//! teacher's `qrwlock` uses for its own acquire paths.

use core::sync::atomic::{fence, Ordering};
use std::time::Instant;

use spin::relax::{RelaxStrategy, Spin};

use crate::backend;
use crate::bits::{self, WaitFlags};
use crate::phase::{CurrentState, Phase};
use crate::raw::{self, RawWord};

/// The bare synchronizer: one 8-byte word, no user data attached. This is
/// the type that implements spec.md §6.2 directly; [`crate::WrfLock<T>`]
/// wraps it with a data cell and RAII guards for ergonomic use.
pub struct RawWrfLock {
    word: RawWord,
}

impl RawWrfLock {
    /// Creates a lock primed in `NEXT_W` (spec.md §3, "Lifecycle"): the
    /// first writer's acquire transitions directly into `CURR_W`.
    pub fn new(wait_flags: WaitFlags, pshared: bool) -> Self {
        let yield_bits = wait_flags.to_state_bits();
        Self {
            word: RawWord::new(raw::initial_word(yield_bits, pshared)),
        }
    }

    // ---- 4.C.1 write acquire ----
    pub fn w_acquire(&self) -> bool {
        let mut s = self.word.load_s(Ordering::Relaxed);
        loop {
            if s & bits::ACQ_W != 0 {
                return false;
            }
            let mut s2 = s | bits::ACQ_W;
            if s2 & bits::ACQ_F != 0 {
                s2 |= bits::RD_NEXT_LOOP;
            }
            if s2 & bits::NEXT_W != 0 {
                s2 ^= bits::NEXT_W | bits::CURR_W;
            }
            match self.word.cas_s(s, s2, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(actual) => s = actual,
            }
        }
    }

    // ---- 4.C.2 read acquire ----
    pub fn r_acquire(&self) -> bool {
        // 1. Barrier loop: don't let readers snoop ahead of a queued
        // freer/writer hand-off.
        loop {
            let s = self.word.load_s(Ordering::Acquire);
            if s & bits::RD_NEXT_LOOP == 0 {
                break;
            }
            if s & bits::YIELD_R != 0 {
                Spin::relax();
            } else {
                backend::wait(self.word.state_atomic(), s, 0);
            }
        }

        // 2. Counter bump, on the full word so it composes atomically with
        // any concurrent state observation.
        let mut w = self.word.load_w(Ordering::Relaxed);
        loop {
            let c = bits::c_of(w) & bits::RD_COUNT_MASK;
            if c == bits::RD_COUNT_MAX {
                return false;
            }
            let new_w = w + bits::READER_INC;
            match self.word.cas_w(w, new_w, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => break,
                Err(actual) => w = actual,
            }
        }

        // 3. State bump.
        let mut s = self.word.load_s(Ordering::Relaxed);
        loop {
            let mut s2 = s | bits::ACQ_R;
            if s2 & bits::NEXT_RF != 0 {
                s2 ^= bits::NEXT_RF | bits::CURR_R;
            }
            match self.word.cas_s(s, s2, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(actual) => s = actual,
            }
        }
    }

    // ---- 4.C.3 free acquire ----
    pub fn f_acquire(&self) -> bool {
        let mut s = self.word.load_s(Ordering::Relaxed);
        loop {
            if s & bits::ACQ_F != 0 {
                return false;
            }
            let mut s2 = s | bits::ACQ_F;
            if s2 & bits::NEXT_RF != 0 {
                s2 ^= bits::NEXT_RF | bits::CURR_F;
            }
            match self.word.cas_s(s, s2, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(actual) => s = actual,
            }
        }
    }

    // ---- 4.C.4 write release ----
    pub fn w_release(&self) -> bool {
        let mut s = self.word.load_s(Ordering::Relaxed);
        loop {
            if s & bits::ACQ_W == 0 {
                return false;
            }
            // A writer parked behind a queued freer may have left readers
            // blocked in their barrier loop on the *old* RD_NEXT_LOOP value;
            // since that bit is about to clear, those readers need an
            // explicit wake even though the published S' no longer carries it.
            let had_rd_next_loop = s & bits::RD_NEXT_LOOP != 0;
            let mut s2 = s & !(bits::ACQ_W | bits::CURR_W | bits::RD_NEXT_LOOP);
            if s2 & bits::ACQ_R != 0 {
                s2 |= bits::CURR_R;
            } else if s2 & bits::ACQ_F != 0 {
                s2 |= bits::CURR_F;
            } else {
                s2 |= bits::NEXT_RF;
            }
            match self.word.cas_s(s, s2, Ordering::Release, Ordering::Relaxed) {
                Ok(_) => {
                    let wake_readers =
                        (s2 & bits::CURR_R != 0 || had_rd_next_loop) && s2 & bits::YIELD_R == 0;
                    let wake_freer = s2 & bits::CURR_F != 0 && s2 & bits::YIELD_F == 0;
                    if wake_readers {
                        // More than one reader (plus any barrier-parked
                        // stragglers) may be waiting on this address.
                        backend::wake_all(self.word.state_atomic());
                    } else if wake_freer {
                        // ACQ_F is single-slot: at most one freer is parked.
                        backend::wake_one(self.word.state_atomic());
                    }
                    return true;
                }
                Err(actual) => s = actual,
            }
        }
    }

    // ---- 4.C.5 read release ----
    pub fn r_release(&self) -> bool {
        let mut w = self.word.load_w(Ordering::Relaxed);
        loop {
            let c = bits::c_of(w);
            if c & bits::RD_COUNT_MASK == 0 {
                return false;
            }
            let s = bits::s_of(w);
            let new_c = c - bits::RD_COUNT_ONE;
            let mut new_s = s;
            if new_c & bits::RD_COUNT_MASK == 0 {
                new_s &= !bits::ACQ_R;
                if new_s & bits::ACQ_F != 0 {
                    new_s ^= bits::CURR_R | bits::CURR_F;
                } else {
                    new_s ^= bits::CURR_R | bits::NEXT_RF;
                }
            }
            let new_w = bits::pack(new_s, new_c);
            match self.word.cas_w(w, new_w, Ordering::Release, Ordering::Relaxed) {
                Ok(_) => {
                    // ACQ_F is single-slot: at most one freer is parked.
                    if new_s & bits::CURR_F != 0 && new_s & bits::YIELD_F == 0 {
                        backend::wake_one(self.word.state_atomic());
                    }
                    return true;
                }
                Err(actual) => w = actual,
            }
        }
    }

    // ---- 4.C.6 free release ----
    pub fn f_release(&self) -> bool {
        let mut s = self.word.load_s(Ordering::Relaxed);
        loop {
            if s & bits::ACQ_F == 0 {
                return false;
            }
            let mut s2 = s & !(bits::ACQ_F | bits::CURR_F);
            if s2 & bits::ACQ_W != 0 {
                s2 |= bits::CURR_W;
            } else {
                s2 |= bits::NEXT_W;
            }
            match self.word.cas_s(s, s2, Ordering::Release, Ordering::Relaxed) {
                Ok(_) => {
                    // ACQ_W is single-slot: at most one writer is parked.
                    if s2 & bits::CURR_W != 0 && s2 & bits::YIELD_W == 0 {
                        backend::wake_one(self.word.state_atomic());
                    }
                    return true;
                }
                Err(actual) => s = actual,
            }
        }
    }

    // ---- 4.C.7 waits ----
    fn wait_phase(&self, curr_bit: u32, yield_bit: u32, timeout_ms: u64) -> bool {
        let start = (timeout_ms > 0).then(Instant::now);
        loop {
            let s = self.word.load_s(Ordering::Relaxed);
            if s & curr_bit != 0 {
                fence(Ordering::Acquire);
                return true;
            }
            if s & yield_bit == 0 {
                // Every spurious wakeup restarts the budget with the
                // original timeout; this is the documented ~2x worst case
                // (spec.md §4.C.7, "timeout accuracy").
                if !backend::wait(self.word.state_atomic(), s, timeout_ms) {
                    return false;
                }
            } else {
                if let Some(start) = start {
                    if start.elapsed().as_millis() as u64 > timeout_ms {
                        return false;
                    }
                }
                Spin::relax();
            }
        }
    }

    pub fn w_wait(&self, timeout_ms: u64) -> bool {
        self.wait_phase(bits::CURR_W, bits::YIELD_W, timeout_ms)
    }

    pub fn r_wait(&self, timeout_ms: u64) -> bool {
        self.wait_phase(bits::CURR_R, bits::YIELD_R, timeout_ms)
    }

    pub fn f_wait(&self, timeout_ms: u64) -> bool {
        self.wait_phase(bits::CURR_F, bits::YIELD_F, timeout_ms)
    }

    fn try_wait_phase(&self, curr_bit: u32) -> bool {
        self.word.load_s(Ordering::Acquire) & curr_bit != 0
    }

    pub fn w_try_wait(&self) -> bool {
        self.try_wait_phase(bits::CURR_W)
    }

    pub fn r_try_wait(&self) -> bool {
        self.try_wait_phase(bits::CURR_R)
    }

    pub fn f_try_wait(&self) -> bool {
        self.try_wait_phase(bits::CURR_F)
    }

    // ---- component D: wait-strategy layer ----

    /// Atomically updates the three `YIELD_*` bits, waking any blocked
    /// waiter whose phase just switched from block to yield (it must wake
    /// up to notice the strategy change).
    pub fn set_flags(&self, flags: WaitFlags) {
        let new_yield_bits = flags.to_state_bits();
        let mut s = self.word.load_s(Ordering::Relaxed);
        loop {
            let old_yield = s & bits::YIELD_MASK;
            let turned_yield = new_yield_bits & !old_yield;
            let s2 = (s & !bits::YIELD_MASK) | new_yield_bits;
            match self.word.cas_s(s, s2, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => {
                    if turned_yield != 0 {
                        backend::wake_all(self.word.state_atomic());
                    }
                    return;
                }
                Err(actual) => s = actual,
            }
        }
    }

    // ---- component E: unified dispatcher ----

    pub fn acquire(&self, phase: Phase) -> bool {
        match phase {
            Phase::Write => self.w_acquire(),
            Phase::Read => self.r_acquire(),
            Phase::Free => self.f_acquire(),
        }
    }

    pub fn release(&self, phase: Phase) -> bool {
        match phase {
            Phase::Write => self.w_release(),
            Phase::Read => self.r_release(),
            Phase::Free => self.f_release(),
        }
    }

    pub fn wait(&self, phase: Phase, timeout_ms: u64) -> bool {
        match phase {
            Phase::Write => self.w_wait(timeout_ms),
            Phase::Read => self.r_wait(timeout_ms),
            Phase::Free => self.f_wait(timeout_ms),
        }
    }

    pub fn try_wait(&self, phase: Phase) -> bool {
        match phase {
            Phase::Write => self.w_try_wait(),
            Phase::Read => self.r_try_wait(),
            Phase::Free => self.f_try_wait(),
        }
    }

    pub fn get_current_state(&self) -> CurrentState {
        let s = self.word.load_s(Ordering::Acquire);
        if s & bits::CURR_W != 0 {
            CurrentState::Write
        } else if s & bits::CURR_R != 0 {
            CurrentState::Read
        } else if s & bits::CURR_F != 0 {
            CurrentState::Free
        } else {
            CurrentState::Uninit
        }
    }

    /// Raw state-half snapshot, exposed for tests that check the invariants
    /// of spec.md §8 directly.
    #[cfg(test)]
    pub(crate) fn raw_state(&self) -> u32 {
        self.word.load_s(Ordering::Acquire)
    }
}

unsafe impl Send for RawWrfLock {}
unsafe impl Sync for RawWrfLock {}
