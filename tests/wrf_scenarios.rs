//! End-to-end scenarios, one test per scenario in the design notes'
//! testable-properties section. Every scenario uses an external atomic
//! counter `K` to observe ordering across the write/read/free cycle.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use wrflock::{WaitFlags, WrfLock};

const READERS: usize = 4;

fn wrf_cycle(flags: WaitFlags) -> i64 {
    let lock = Arc::new(WrfLock::new(0i64, flags, false));
    let k = Arc::new(AtomicI64::new(0));

    let w_lock = lock.clone();
    let w_k = k.clone();
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(120));
        let mut guard = w_lock.write().unwrap();
        *guard = 1;
        w_k.store(1, Ordering::SeqCst);
    });

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let lock = lock.clone();
            let k = k.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(30));
                let guard = lock.read().unwrap();
                assert_eq!(k.load(Ordering::SeqCst), 1);
                assert_eq!(*guard, 1);
            })
        })
        .collect();

    let f_lock = lock.clone();
    let f_k = k.clone();
    let freer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(70));
        assert!(f_lock.raw().f_acquire());
        assert!(f_lock.raw().f_wait(1000));
        f_k.store(-10_000, Ordering::SeqCst);
        assert!(f_lock.raw().f_release());
    });

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    freer.join().unwrap();

    k.load(Ordering::SeqCst)
}

/// Scenario 1: WRF cycle with the default blocking strategy.
#[test]
fn scenario_1_wrf_cycle_blocking() {
    assert_eq!(wrf_cycle(WaitFlags::empty()), -10_000);
}

/// Scenario 2: same cycle with every phase set to yield-spin.
#[test]
fn scenario_2_wrf_cycle_yielding() {
    let flags = WaitFlags::WRITE_YIELD | WaitFlags::READ_YIELD | WaitFlags::FREE_YIELD;
    assert_eq!(wrf_cycle(flags), -10_000);
}

/// Scenario 3: a lone freer times out when no writer ever runs.
#[test]
fn scenario_3_freer_timeout() {
    let lock = WrfLock::new((), WaitFlags::empty(), false);

    assert!(lock.raw().f_acquire());
    assert!(!lock.raw().f_wait(50));
    assert!(lock.raw().f_release());
}

/// Scenario 4: a freer queued ahead of a writer forces incoming readers to
/// park in the barrier loop until the writer completes.
#[test]
fn scenario_4_reader_admission_barrier() {
    let lock = Arc::new(WrfLock::new((), WaitFlags::empty(), false));

    // Freer queues first.
    assert!(lock.raw().f_acquire());
    // Writer queues behind it: this must set RD_NEXT_LOOP.
    assert!(lock.raw().w_acquire());
    assert!(lock.raw().w_wait(0));

    let r_lock = lock.clone();
    let reader_returned = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let r_flag = reader_returned.clone();
    let reader = thread::spawn(move || {
        // r_acquire is a non-blocking reservation; it must still not
        // return while the barrier loop holds it behind RD_NEXT_LOOP.
        assert!(r_lock.raw().r_acquire());
        r_flag.store(true, Ordering::SeqCst);
    });

    thread::sleep(Duration::from_millis(10));
    assert!(
        !reader_returned.load(Ordering::SeqCst),
        "reader's acquire returned past a queued writer"
    );

    // Admits the freer and clears RD_NEXT_LOOP, waking the parked reader.
    assert!(lock.raw().w_release());
    reader.join().unwrap();
    assert!(reader_returned.load(Ordering::SeqCst));

    // The freer finishes its phase; nobody queued a second writer, so the
    // machine parks at NEXT_W with the earlier reader's ACQ_R still pending.
    assert!(lock.raw().f_wait(0));
    assert!(lock.raw().f_release());

    // A fresh writer completes the cycle; the pending reader is finally
    // admitted to CURR_R.
    assert!(lock.raw().w_acquire());
    assert!(lock.raw().w_wait(0));
    assert!(lock.raw().w_release());

    assert!(lock.raw().r_wait(1000));
    assert!(lock.raw().r_release());
}

/// Scenario 5: overflow is reported on the second acquire and the second
/// release.
#[test]
fn scenario_5_overflow_reporting() {
    let lock = WrfLock::new((), WaitFlags::empty(), false);

    assert!(lock.raw().w_acquire());
    assert!(!lock.raw().w_acquire());

    assert!(lock.raw().w_release());
    assert!(!lock.raw().w_release());
}

/// Scenario 6: flipping a phase from block to yield wakes a thread parked
/// on the futex wait for that phase.
#[test]
fn scenario_6_flag_flip_wakes_blockers() {
    let lock = Arc::new(WrfLock::new((), WaitFlags::empty(), false));

    // Put the machine in CURR_W so a read-wait has something to block on.
    assert!(lock.raw().w_acquire());
    assert!(lock.raw().w_wait(0));
    assert!(lock.raw().r_acquire());

    let r_lock = lock.clone();
    let reader = thread::spawn(move || {
        let start = std::time::Instant::now();
        let woke = r_lock.raw().r_wait(5000);
        (woke, start.elapsed())
    });

    // Give the reader time to park on the blocking futex wait.
    thread::sleep(Duration::from_millis(30));
    lock.raw().set_flags(WaitFlags::READ_YIELD);

    // The reader must have returned from the futex wait promptly and
    // switched to spinning; releasing the writer shortly after should let
    // it observe CURR_R well within its 5s timeout budget.
    thread::sleep(Duration::from_millis(20));
    assert!(lock.raw().w_release());

    let (woke, elapsed) = reader.join().unwrap();
    assert!(woke);
    assert!(
        elapsed < Duration::from_millis(500),
        "reader took {elapsed:?}; the flag-flip wake likely failed to unpark it"
    );

    assert!(lock.raw().r_release());
}
