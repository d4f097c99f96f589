/*!
 * Signal
 *
 * Manual-reset or auto-reset waitable event. Backend selected at creation
 * from `SyncConfig`; deadlines computed from the context's time source.
 */

use super::condvar::CondvarEvent;
use super::config::{StrategyType, SyncConfig};
use super::futex::FutexEvent;
use super::traits::{EventStrategy, ResetMode};
use crate::core::time::{millis_to_duration, MonotonicClock, TimeSource};
use std::sync::Arc;
use std::time::Duration;

/// Waitable event
///
/// Initial state is never signaled.
///
/// - **Manual reset**: `raise` releases every waiter and the signal stays
///   raised, so later waits return immediately until `clear`.
/// - **Auto reset**: `raise` releases exactly one blocked waiter; without
///   waiters it leaves one pending signal for the next `wait`. Repeated raises
///   with no waiter collapse into one (a flag, not a counter).
///
/// # Examples
///
/// ```
/// use platform_sync::Signal;
/// use std::time::Duration;
///
/// let done = Signal::new(true);
/// done.raise();
/// assert!(done.wait(None));
/// assert!(done.wait_millis(Signal::WAIT_INFINITE));
///
/// let work = Signal::new(false);
/// assert!(!work.wait(Some(Duration::from_millis(10))));
/// ```
pub struct Signal {
    event: Box<dyn EventStrategy>,
    clock: Arc<dyn TimeSource>,
}

impl Signal {
    /// Millisecond timeout meaning "wait forever"
    pub const WAIT_INFINITE: i32 = -1;

    /// Create with the default configuration and monotonic clock
    pub fn new(manual_reset: bool) -> Self {
        Self::with_config(
            ResetMode::from_manual_reset(manual_reset),
            &SyncConfig::default(),
            Arc::new(MonotonicClock),
        )
    }

    /// Create with an explicit backend configuration and time source
    pub fn with_config(mode: ResetMode, config: &SyncConfig, clock: Arc<dyn TimeSource>) -> Self {
        let event: Box<dyn EventStrategy> = match config.select_strategy() {
            StrategyType::Futex => Box::new(FutexEvent::new(mode)),
            StrategyType::Condvar => Box::new(CondvarEvent::new(mode)),
            StrategyType::Auto => {
                // Should have been resolved by select_strategy
                Box::new(CondvarEvent::new(mode))
            }
        };

        Self { event, clock }
    }

    /// Raise the signal per its reset mode
    #[inline]
    pub fn raise(&self) {
        self.event.raise();
    }

    /// Force the non-signaled state
    #[inline]
    pub fn clear(&self) {
        self.event.clear();
    }

    /// Wait until raised, or until `timeout` elapses (`None` = forever)
    ///
    /// Returns `true` if released, `false` on timeout.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        // An unrepresentable deadline is as good as forever
        let deadline = timeout.and_then(|t| self.clock.deadline_after(t));
        self.event.wait_until(deadline)
    }

    /// Millisecond variant of [`Signal::wait`]
    ///
    /// `WAIT_INFINITE` blocks forever. Other negative values are a caller
    /// bug: asserted in debug builds, treated as a non-blocking poll
    /// otherwise.
    pub fn wait_millis(&self, timeout_ms: i32) -> bool {
        if timeout_ms == Self::WAIT_INFINITE {
            return self.wait(None);
        }
        debug_assert!(timeout_ms >= 0, "invalid signal timeout {timeout_ms}");
        let millis = u32::try_from(timeout_ms).unwrap_or(0);
        self.wait(Some(millis_to_duration(millis)))
    }

    /// Whether a raise is pending (diagnostic; racy by nature)
    pub fn is_signaled(&self) -> bool {
        self.event.is_signaled()
    }

    pub fn is_manual_reset(&self) -> bool {
        self.event.reset_mode().is_manual()
    }

    /// Threads currently blocked in `wait` (diagnostic)
    pub fn waiter_count(&self) -> usize {
        self.event.waiter_count()
    }

    /// Name of the active backend
    pub fn strategy_name(&self) -> &'static str {
        self.event.name()
    }
}

impl std::fmt::Debug for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("strategy", &self.strategy_name())
            .field("manual_reset", &self.is_manual_reset())
            .field("signaled", &self.is_signaled())
            .field("waiting", &self.waiter_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    fn signals(mode: ResetMode) -> Vec<Arc<Signal>> {
        [StrategyType::Futex, StrategyType::Condvar]
            .into_iter()
            .map(|strategy| {
                let config = SyncConfig {
                    strategy,
                    ..Default::default()
                };
                Arc::new(Signal::with_config(mode, &config, Arc::new(MonotonicClock)))
            })
            .collect()
    }

    #[test]
    fn test_initially_not_signaled() {
        for signal in signals(ResetMode::Auto).into_iter().chain(signals(ResetMode::Manual)) {
            assert!(!signal.is_signaled());
            assert!(!signal.wait_millis(0), "{}", signal.strategy_name());
        }
    }

    #[test]
    fn test_auto_reset_releases_single_blocked_waiter() {
        for signal in signals(ResetMode::Auto) {
            let waiter = signal.clone();
            let handle = thread::spawn(move || waiter.wait(None));

            let start = Instant::now();
            while signal.waiter_count() == 0 {
                assert!(start.elapsed() < Duration::from_secs(5));
                thread::sleep(Duration::from_millis(1));
            }

            signal.raise();
            assert!(handle.join().unwrap());
            assert!(!signal.is_signaled(), "{}", signal.strategy_name());
        }
    }

    #[test]
    fn test_auto_reset_repeated_raises_collapse() {
        for signal in signals(ResetMode::Auto) {
            signal.raise();
            signal.raise();
            signal.raise();
            assert!(signal.wait_millis(0));
            assert!(!signal.wait_millis(20), "{}", signal.strategy_name());
        }
    }

    #[test]
    fn test_manual_reset_until_clear() {
        for signal in signals(ResetMode::Manual) {
            signal.raise();
            assert!(signal.wait_millis(Signal::WAIT_INFINITE));
            assert!(signal.wait_millis(0));
            signal.clear();
            assert!(!signal.wait_millis(10), "{}", signal.strategy_name());
        }
    }

    #[test]
    fn test_timeout_duration() {
        for signal in signals(ResetMode::Auto) {
            let start = Instant::now();
            assert!(!signal.wait(Some(Duration::from_millis(100))));
            let elapsed = start.elapsed();
            assert!(elapsed >= Duration::from_millis(100));
            assert!(elapsed < Duration::from_millis(600), "{}", signal.strategy_name());
        }
    }

    #[test]
    fn test_huge_timeout_still_released() {
        let signal = Arc::new(Signal::new(false));
        let waiter = signal.clone();
        let handle = thread::spawn(move || waiter.wait(Some(Duration::MAX)));

        thread::sleep(Duration::from_millis(50));
        signal.raise();
        assert!(handle.join().unwrap());
    }
}
