//! Two-Lock Acquisition Without Global Ordering
//!
//! Merges and equality checks need a joint view of two records that are
//! paired in arbitrary order from many threads. Locking "self then other"
//! deadlocks as soon as two threads pair the same records in opposite
//! order, and records carry no key that would give a total lock order.
//!
//! Instead a thread takes both locks or neither: it tries each lock without
//! blocking, and if either attempt fails it drops whatever it got, backs off
//! and starts over. No thread ever waits while holding a lock, so the pair
//! cannot deadlock. Heavy contention on the same pair can livelock briefly;
//! the back-off in [`PairLockConfig`] lets the other thread finish first.

use crate::config::PairLockConfig;
use parking_lot::{Mutex, MutexGuard};
use std::{hint, thread};

/// Lock two distinct mutexes, retrying until both are held at once.
///
/// Both guards are released when dropped, on every path out of the
/// caller's critical section.
///
/// The two mutexes must be different objects; the same mutex passed twice
/// would never succeed the second `try_lock`.
pub fn lock_both<'a, 'b, A, B>(
    first: &'a Mutex<A>,
    second: &'b Mutex<B>,
    config: &PairLockConfig,
) -> (MutexGuard<'a, A>, MutexGuard<'b, B>) {
    debug_assert!(
        !std::ptr::eq(
            (first as *const Mutex<A>).cast::<u8>(),
            (second as *const Mutex<B>).cast::<u8>()
        ),
        "lock_both called with the same mutex twice"
    );

    let mut attempts: u64 = 0;
    loop {
        if let Some(first_guard) = first.try_lock() {
            if let Some(second_guard) = second.try_lock() {
                if attempts >= u64::from(config.contention_log_threshold) {
                    tracing::trace!(attempts, "lock pair acquired after contention");
                }
                return (first_guard, second_guard);
            }
            // first_guard drops here so the other thread can take it
        }
        attempts += 1;
        back_off(attempts, config);
    }
}

/// Spin, then yield, then sleep, depending on how long we have been retrying
fn back_off(attempt: u64, config: &PairLockConfig) {
    let spin = u64::from(config.spin_limit);
    let yields = spin + u64::from(config.yield_limit);

    if attempt <= spin {
        hint::spin_loop();
    } else if attempt <= yields || config.sleep_micros == 0 {
        thread::yield_now();
    } else {
        thread::sleep(config.sleep());
    }
}
