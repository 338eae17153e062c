//! Convenience surface (component E, spec.md §4.E): a data-carrying wrapper
//! around [`RawWrfLock`] with RAII guards, generalizing the teacher's
//! two-phase `RwLock<T>`/`ReadGuard`/`WriteGuard` pattern to three phases.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};

use crate::bits::WaitFlags;
use crate::core_state::RawWrfLock;
use crate::error::LockError;
use crate::phase::Phase;

/// A Write/Read/Free cyclic lock wrapping a piece of data.
///
/// The three phases are mutually exclusive and run in the fixed cycle
/// Write → Read → Free → Write (spec.md §1). `Writer` and `Freer` give
/// exclusive (`&mut T`) access; `Reader` gives shared (`&T`) access and may
/// be held by more than one thread at once.
pub struct WrfLock<T> {
    raw: RawWrfLock,
    data: UnsafeCell<T>,
}

unsafe impl<T: Send> Send for WrfLock<T> {}
unsafe impl<T: Send> Sync for WrfLock<T> {}

impl<T> WrfLock<T> {
    /// Creates a lock primed for its first writer.
    pub fn new(data: T, wait_flags: WaitFlags, pshared: bool) -> Self {
        Self {
            raw: RawWrfLock::new(wait_flags, pshared),
            data: UnsafeCell::new(data),
        }
    }

    /// Access to the raw state machine, for callers that want the §6.2
    /// primitive operations directly instead of the guard/scoped surface.
    pub fn raw(&self) -> &RawWrfLock {
        &self.raw
    }

    /// Acquires, infinitely waits for, and returns a write guard.
    pub fn write(&self) -> Result<Writer<'_, T>, LockError> {
        if !self.raw.w_acquire() {
            return Err(LockError::Overflow);
        }
        let woke = self.raw.w_wait(0);
        debug_assert!(woke, "infinite wait returned false");
        Ok(Writer { lock: self })
    }

    /// Acquires, infinitely waits for, and returns a read guard.
    pub fn read(&self) -> Result<Reader<'_, T>, LockError> {
        if !self.raw.r_acquire() {
            return Err(LockError::Overflow);
        }
        let woke = self.raw.r_wait(0);
        debug_assert!(woke, "infinite wait returned false");
        Ok(Reader { lock: self })
    }

    /// Acquires, infinitely waits for, and returns a free guard.
    pub fn free(&self) -> Result<Freer<'_, T>, LockError> {
        if !self.raw.f_acquire() {
            return Err(LockError::Overflow);
        }
        let woke = self.raw.f_wait(0);
        debug_assert!(woke, "infinite wait returned false");
        Ok(Freer { lock: self })
    }

    /// Runs `body` under the write phase, releasing even if `body` panics
    /// only insofar as the guard's `Drop` runs during unwind; release
    /// failure after a successful acquire is a protocol violation and
    /// panics rather than propagating, per spec.md §7.
    pub fn scoped_write<R>(&self, body: impl FnOnce(&mut T) -> R) -> Result<R, LockError> {
        let mut guard = self.write()?;
        Ok(body(&mut guard))
    }

    /// Runs `body` under the read phase.
    pub fn scoped_read<R>(&self, body: impl FnOnce(&T) -> R) -> Result<R, LockError> {
        let guard = self.read()?;
        Ok(body(&guard))
    }

    /// Runs `body` under the free phase.
    pub fn scoped_free<R>(&self, body: impl FnOnce(&mut T) -> R) -> Result<R, LockError> {
        let mut guard = self.free()?;
        Ok(body(&mut guard))
    }

    /// Acquires the write phase, then instead of blocking/yielding in
    /// `wait`, repeatedly calls `poll` until `w_try_wait` reports the phase
    /// is current, the second convenience-surface variant from spec.md
    /// §4.E, for callers that want to do other work (drain a queue, service
    /// a watchdog) while parked behind the cycle.
    pub fn scoped_write_poll<R>(
        &self,
        mut poll: impl FnMut(),
        body: impl FnOnce(&mut T) -> R,
    ) -> Result<R, LockError> {
        if !self.raw.w_acquire() {
            return Err(LockError::Overflow);
        }
        while !self.raw.w_try_wait() {
            poll();
        }
        let result = body(unsafe { &mut *self.data.get() });
        let released = self.raw.w_release();
        assert!(released, "w_release failed after a successful w_acquire");
        Ok(result)
    }

    /// Polling variant of [`Self::scoped_read`].
    pub fn scoped_read_poll<R>(
        &self,
        mut poll: impl FnMut(),
        body: impl FnOnce(&T) -> R,
    ) -> Result<R, LockError> {
        if !self.raw.r_acquire() {
            return Err(LockError::Overflow);
        }
        while !self.raw.r_try_wait() {
            poll();
        }
        let result = body(unsafe { &*self.data.get() });
        let released = self.raw.r_release();
        assert!(released, "r_release failed after a successful r_acquire");
        Ok(result)
    }

    /// Polling variant of [`Self::scoped_free`].
    pub fn scoped_free_poll<R>(
        &self,
        mut poll: impl FnMut(),
        body: impl FnOnce(&mut T) -> R,
    ) -> Result<R, LockError> {
        if !self.raw.f_acquire() {
            return Err(LockError::Overflow);
        }
        while !self.raw.f_try_wait() {
            poll();
        }
        let result = body(unsafe { &mut *self.data.get() });
        let released = self.raw.f_release();
        assert!(released, "f_release failed after a successful f_acquire");
        Ok(result)
    }

    /// Consumes the lock, returning the wrapped data.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    /// Returns a mutable reference to the wrapped data, bypassing the
    /// state machine entirely (sound because `&mut self` proves exclusive
    /// access).
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

/// Guard granting exclusive access during the write phase.
pub struct Writer<'a, T> {
    lock: &'a WrfLock<T>,
}

/// Guard granting shared access during the read phase. More than one may
/// be live at once.
pub struct Reader<'a, T> {
    lock: &'a WrfLock<T>,
}

/// Guard granting exclusive access during the free phase.
pub struct Freer<'a, T> {
    lock: &'a WrfLock<T>,
}

impl<'a, T> Deref for Writer<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for Writer<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Deref for Reader<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> Deref for Freer<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        unsafe { &*self.lock.data.get() }
    }
}

impl<'a, T> DerefMut for Freer<'a, T> {
    fn deref_mut(&mut self) -> &mut T {
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<'a, T> Drop for Writer<'a, T> {
    fn drop(&mut self) {
        let released = self.lock.raw.w_release();
        debug_assert!(released, "w_release failed on guard drop: protocol violation");
    }
}

impl<'a, T> Drop for Reader<'a, T> {
    fn drop(&mut self) {
        let released = self.lock.raw.r_release();
        debug_assert!(released, "r_release failed on guard drop: protocol violation");
    }
}

impl<'a, T> Drop for Freer<'a, T> {
    fn drop(&mut self) {
        let released = self.lock.raw.f_release();
        debug_assert!(released, "f_release failed on guard drop: protocol violation");
    }
}

/// Dispatches on a runtime [`Phase`] value rather than calling the
/// phase-specific method directly: the unified surface from spec.md §6.2.
impl<T> WrfLock<T> {
    pub fn phase_acquire(&self, phase: Phase) -> bool {
        self.raw.acquire(phase)
    }

    pub fn phase_release(&self, phase: Phase) -> bool {
        self.raw.release(phase)
    }

    pub fn phase_wait(&self, phase: Phase, timeout_ms: u64) -> bool {
        self.raw.wait(phase, timeout_ms)
    }

    pub fn phase_try_wait(&self, phase: Phase) -> bool {
        self.raw.try_wait(phase)
    }
}
