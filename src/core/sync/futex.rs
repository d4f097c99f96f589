/*!
 * Futex-Based Event
 *
 * Address-keyed parking via parking_lot_core. On Linux the parking lot maps
 * to futex syscalls; the pending-flag decision for auto-reset raises is taken
 * inside the unpark callback, under the same queue lock the waiters validate
 * against, so no raise is ever lost.
 */

use super::traits::{EventStrategy, ResetMode};
use parking_lot_core::{
    park, unpark_all, unpark_one, ParkResult, DEFAULT_PARK_TOKEN, DEFAULT_UNPARK_TOKEN,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

/// Futex-based event
///
/// # Performance
///
/// - Lock-free fast path when the event is already signaled
/// - Zero allocations
/// - No spurious wake-ups (parking_lot_core only returns on unpark/timeout)
#[repr(C, align(64))]
pub struct FutexEvent {
    /// Pending signal; its address is also the parking key
    signaled: AtomicBool,
    waiters: AtomicUsize,
    mode: ResetMode,
}

impl FutexEvent {
    /// Create a non-signaled event
    pub fn new(mode: ResetMode) -> Self {
        Self {
            signaled: AtomicBool::new(false),
            waiters: AtomicUsize::new(0),
            mode,
        }
    }

    /// Stable parking address (same in wait and raise)
    #[inline]
    fn key(&self) -> usize {
        &self.signaled as *const AtomicBool as usize
    }

    /// Take the pending signal if present
    ///
    /// Auto-reset consumes the flag; manual-reset leaves it set.
    #[inline]
    fn try_consume(&self) -> bool {
        match self.mode {
            ResetMode::Manual => self.signaled.load(Ordering::SeqCst),
            ResetMode::Auto => self
                .signaled
                .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok(),
        }
    }
}

impl EventStrategy for FutexEvent {
    fn raise(&self) {
        let key = self.key();

        match self.mode {
            ResetMode::Manual => {
                self.signaled.store(true, Ordering::SeqCst);
                // SAFETY: key is the address of our own field, unique while
                // we are alive; no callbacks are involved.
                unsafe { unpark_all(key, DEFAULT_UNPARK_TOKEN) };
            }
            ResetMode::Auto => {
                // SAFETY: the callback only touches an atomic and cannot
                // panic or re-enter the parking lot.
                unsafe {
                    unpark_one(key, |result| {
                        if result.unparked_threads == 0 {
                            // No waiters: save the signal for the next wait
                            self.signaled.store(true, Ordering::SeqCst);
                        }
                        DEFAULT_UNPARK_TOKEN
                    })
                };
            }
        }
    }

    fn clear(&self) {
        self.signaled.store(false, Ordering::SeqCst);
    }

    fn wait_until(&self, deadline: Option<Instant>) -> bool {
        if self.try_consume() {
            return true;
        }

        let key = self.key();

        // SAFETY: validate/timed_out only touch atomics, cannot panic and do
        // not call back into parking_lot.
        let result = unsafe {
            park(
                key,
                || {
                    // Re-check under the queue lock
                    if self.try_consume() {
                        false
                    } else {
                        self.waiters.fetch_add(1, Ordering::Relaxed);
                        true
                    }
                },
                || {},
                |_key, _was_last| {},
                DEFAULT_PARK_TOKEN,
                deadline,
            )
        };

        match result {
            ParkResult::Unparked(_) => {
                self.waiters.fetch_sub(1, Ordering::Relaxed);
                true
            }
            ParkResult::TimedOut => {
                self.waiters.fetch_sub(1, Ordering::Relaxed);
                false
            }
            // Validation consumed a pending signal without parking
            ParkResult::Invalid => true,
        }
    }

    fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }

    fn waiter_count(&self) -> usize {
        self.waiters.load(Ordering::Relaxed)
    }

    fn reset_mode(&self) -> ResetMode {
        self.mode
    }

    fn name(&self) -> &'static str {
        "futex"
    }
}
