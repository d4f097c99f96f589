/*!
 * Condvar-Based Event
 *
 * Cross-platform backend using parking_lot::{Mutex, Condvar}
 */

use super::traits::{EventStrategy, ResetMode};
use parking_lot::{Condvar, Mutex};
use std::time::Instant;

/// State guarded by the event's own mutex
#[derive(Debug, Default)]
struct EventState {
    /// Pending signal (flag, not a counter)
    signaled: bool,
    /// Threads blocked in `wait_until`
    waiting: usize,
    /// Auto-reset releases granted to blocked waiters but not yet consumed
    releases: usize,
    /// Bumped on every manual-reset raise so a waiter cannot miss a raise
    /// that is cleared again before it wakes
    generation: u64,
}

/// Condvar-based event
///
/// # Performance
///
/// - Slightly more overhead than the futex backend
/// - Works on all platforms
/// - Reliable and well-tested
pub struct CondvarEvent {
    mode: ResetMode,
    state: Mutex<EventState>,
    condvar: Condvar,
}

impl CondvarEvent {
    /// Create a non-signaled event
    pub fn new(mode: ResetMode) -> Self {
        Self {
            mode,
            state: Mutex::new(EventState::default()),
            condvar: Condvar::new(),
        }
    }

    /// Whether a blocked waiter that started at `generation` may leave
    #[inline]
    fn released(&self, state: &EventState, generation: u64) -> bool {
        match self.mode {
            ResetMode::Manual => state.signaled || state.generation != generation,
            ResetMode::Auto => state.releases > 0,
        }
    }
}

impl EventStrategy for CondvarEvent {
    fn raise(&self) {
        let mut state = self.state.lock();

        match self.mode {
            ResetMode::Manual => {
                // Signaled until cleared; release everyone
                state.signaled = true;
                state.generation = state.generation.wrapping_add(1);
                self.condvar.notify_all();
            }
            ResetMode::Auto => {
                if state.waiting > state.releases {
                    // A blocked waiter without a pending release: hand it one
                    state.releases += 1;
                    self.condvar.notify_one();
                } else {
                    // Nobody left to release; keep a single pending signal
                    state.signaled = true;
                }
            }
        }
    }

    fn clear(&self) {
        self.state.lock().signaled = false;
    }

    fn wait_until(&self, deadline: Option<Instant>) -> bool {
        let mut state = self.state.lock();

        if state.signaled {
            // For auto-reset only this thread may be released
            if self.mode == ResetMode::Auto {
                state.signaled = false;
            }
            return true;
        }

        state.waiting += 1;
        let generation = state.generation;

        let woken = loop {
            if self.released(&state, generation) {
                if self.mode == ResetMode::Auto {
                    state.releases -= 1;
                }
                break true;
            }

            match deadline {
                Some(deadline) => {
                    // A release may race with the timeout; honour it if so
                    if self.condvar.wait_until(&mut state, deadline).timed_out()
                        && !self.released(&state, generation)
                    {
                        break false;
                    }
                }
                None => self.condvar.wait(&mut state),
            }
        };

        state.waiting -= 1;
        woken
    }

    fn is_signaled(&self) -> bool {
        self.state.lock().signaled
    }

    fn waiter_count(&self) -> usize {
        self.state.lock().waiting
    }

    fn reset_mode(&self) -> ResetMode {
        self.mode
    }

    fn name(&self) -> &'static str {
        "condvar"
    }
}
