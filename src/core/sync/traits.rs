/*!
 * Synchronization Traits
 *
 * Capability interface every signal backend implements. The backend is chosen
 * once, when the signal is created, from `SyncConfig`.
 */

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// How a raised signal returns to the non-signaled state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetMode {
    /// Stays signaled, releasing every waiter, until `clear`
    Manual,
    /// Releases a single waiter per raise, then resets itself
    Auto,
}

impl ResetMode {
    #[inline(always)]
    pub fn from_manual_reset(manual_reset: bool) -> Self {
        if manual_reset {
            ResetMode::Manual
        } else {
            ResetMode::Auto
        }
    }

    #[inline(always)]
    pub fn is_manual(self) -> bool {
        matches!(self, ResetMode::Manual)
    }
}

/// Waitable event backend
///
/// Implementations must be:
/// - **Thread-safe**: any method may be called from any thread
/// - **Spurious-wake safe**: `wait_until` only returns `true` for a real raise
/// - **Lossless**: an auto-reset raise with blocked waiters releases exactly
///   one of them; without waiters it leaves a single pending signal (a flag,
///   not a counter)
pub trait EventStrategy: Send + Sync {
    /// Raise the event per its reset mode
    fn raise(&self);

    /// Force the non-signaled state
    fn clear(&self);

    /// Block until raised or `deadline` passes (`None` = no deadline)
    ///
    /// Returns `true` if released by a raise (or a pending signal was
    /// consumed), `false` on timeout.
    fn wait_until(&self, deadline: Option<Instant>) -> bool;

    /// Whether the pending flag is currently set (diagnostic)
    fn is_signaled(&self) -> bool;

    /// Number of threads currently blocked in `wait_until` (diagnostic)
    fn waiter_count(&self) -> usize;

    /// Reset mode chosen at creation
    fn reset_mode(&self) -> ResetMode;

    /// Backend name for debugging
    fn name(&self) -> &'static str;
}
