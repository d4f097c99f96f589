/*!
 * Time Source
 *
 * Clock used to turn relative wait timeouts into absolute deadlines.
 */

use std::time::{Duration, Instant};

/// Supplies the current time for deadline computation
pub trait TimeSource: Send + Sync {
    /// Current reading of the clock
    fn now(&self) -> Instant;

    /// Absolute deadline `timeout` from now
    ///
    /// Returns `None` when the deadline is not representable, which callers
    /// treat as an infinite wait.
    fn deadline_after(&self, timeout: Duration) -> Option<Instant> {
        self.now().checked_add(timeout)
    }
}

/// Monotonic clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicClock;

impl TimeSource for MonotonicClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Convert a millisecond timeout to a `Duration`
///
/// Sub-second remainders carry into the nanosecond field, so 1500 ms is
/// one second plus 500 000 000 ns.
#[inline]
pub fn millis_to_duration(millis: u32) -> Duration {
    Duration::new(u64::from(millis / 1000), (millis % 1000) * 1_000_000)
}
