//! A Write/Read/Free cyclic lock (WRFLock): a synchronization primitive that
//! serializes three phases of access to a shared resource in strict order:
//! a single writer produces, any number of readers consume, a single freer
//! reclaims, then cycles back to write.
//!
//! Intended as the per-slot synchronizer for a single-producer
//! multiple-consumer ring buffer with explicit memory management
//! (Orlikowski, 2019): the writer fills a slot, readers drain it, the freer
//! reclaims it once every reader is done, and the slot is handed back to
//! the next writer.
//!
//! The whole machine lives in one 8-byte word (see [`bits`] for the layout)
//! manipulated with compare-and-swap loops, and parks blocked waiters on an
//! OS address-based wait primitive (`futex` on Linux, `__ulock_wait` on
//! Darwin, `WaitOnAddress` on Windows) via the [`backend`] module. Each
//! phase independently chooses between blocking and CPU-relax spinning
//! (`WaitFlags`), toggleable at runtime.
//!
//! No fairness guarantee beyond the phase ordering, no priority
//! inheritance, no reentrancy. Writer and freer are single-slot; readers
//! are capped at 65535 concurrent holders.

mod backend;
mod bits;
mod core_state;
mod error;
mod phase;
mod raw;

mod lock;

pub use bits::WaitFlags;
pub use core_state::RawWrfLock;
pub use error::LockError;
pub use lock::{Freer, Reader, WrfLock, Writer};
pub use phase::{CurrentState, Phase};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn single_threaded_cycle() {
        let lock = WrfLock::new(0u32, WaitFlags::empty(), false);

        assert_eq!(lock.raw().get_current_state(), CurrentState::Uninit);

        {
            let mut w = lock.write().unwrap();
            *w = 42;
        }

        {
            let r = lock.read().unwrap();
            assert_eq!(*r, 42);
        }

        {
            let mut f = lock.free().unwrap();
            *f = 0;
        }

        // Only after a full write -> read -> free cycle does the machine
        // accept another writer.
        {
            let w = lock.write().unwrap();
            assert_eq!(*w, 0);
        }
    }

    #[test]
    fn overflow_reporting() {
        let lock = WrfLock::new((), WaitFlags::empty(), false);

        let first = lock.raw().w_acquire();
        let second = lock.raw().w_acquire();
        assert!(first);
        assert!(!second);

        assert!(lock.raw().w_release());
        assert!(!lock.raw().w_release());
    }

    #[test]
    fn reader_cap() {
        let lock = WrfLock::new((), WaitFlags::empty(), false);
        assert!(lock.raw().w_acquire());
        assert!(lock.raw().w_wait(0));
        assert!(lock.raw().w_release());

        for _ in 0..65_535u32 {
            assert!(lock.raw().r_acquire());
        }
        assert!(!lock.raw().r_acquire());
    }

    #[test]
    fn freer_timeout() {
        let lock = WrfLock::new((), WaitFlags::empty(), false);
        assert!(lock.raw().f_acquire());
        assert!(!lock.raw().f_wait(50));
        assert!(lock.raw().f_release());
    }

    #[test]
    fn wrf_cycle_multi_threaded() {
        const READERS: usize = 4;

        let lock = Arc::new(WrfLock::new(0i64, WaitFlags::empty(), false));
        let k: Arc<std::sync::atomic::AtomicI64> = Arc::new(std::sync::atomic::AtomicI64::new(0));

        let w_lock = lock.clone();
        let w_k = k.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            let mut guard = w_lock.write().unwrap();
            *guard = 1;
            w_k.store(1, std::sync::atomic::Ordering::SeqCst);
        });

        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let lock = lock.clone();
                let k = k.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(20));
                    let guard = lock.read().unwrap();
                    assert_eq!(k.load(std::sync::atomic::Ordering::SeqCst), 1);
                    assert_eq!(*guard, 1);
                })
            })
            .collect();

        let f_lock = lock.clone();
        let f_k = k.clone();
        let freer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            assert!(f_lock.raw().f_acquire());
            assert!(f_lock.raw().f_wait(1000));
            f_k.store(-10_000, std::sync::atomic::Ordering::SeqCst);
            assert!(f_lock.raw().f_release());
        });

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        freer.join().unwrap();

        assert_eq!(k.load(std::sync::atomic::Ordering::SeqCst), -10_000);
    }

    #[test]
    fn all_yield_strategy() {
        const READERS: usize = 4;

        let flags = WaitFlags::WRITE_YIELD | WaitFlags::READ_YIELD | WaitFlags::FREE_YIELD;
        let lock = Arc::new(WrfLock::new(0i64, flags, false));
        let k: Arc<std::sync::atomic::AtomicI64> = Arc::new(std::sync::atomic::AtomicI64::new(0));

        let w_lock = lock.clone();
        let w_k = k.clone();
        let writer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let mut guard = w_lock.write().unwrap();
            *guard = 1;
            w_k.store(1, std::sync::atomic::Ordering::SeqCst);
        });

        let readers: Vec<_> = (0..READERS)
            .map(|_| {
                let lock = lock.clone();
                let k = k.clone();
                thread::spawn(move || {
                    thread::sleep(Duration::from_millis(10));
                    let guard = lock.read().unwrap();
                    assert_eq!(k.load(std::sync::atomic::Ordering::SeqCst), 1);
                    assert_eq!(*guard, 1);
                })
            })
            .collect();

        let f_lock = lock.clone();
        let f_k = k.clone();
        let freer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(25));
            let _guard = f_lock.free().unwrap();
            f_k.store(-10_000, std::sync::atomic::Ordering::SeqCst);
        });

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        freer.join().unwrap();

        assert_eq!(k.load(std::sync::atomic::Ordering::SeqCst), -10_000);
    }
}
