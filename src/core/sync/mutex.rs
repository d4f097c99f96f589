/*!
 * Error-Checking Mutex
 *
 * Mutual-exclusion lock with a non-blocking fast path, a bounded spin and a
 * parking fallback. Ownership is tracked per thread so that a re-lock from
 * the owner is rejected instead of deadlocking.
 */

use super::config::SyncConfig;
use crate::core::errors::{MutexError, MutexResult};
use crate::core::thread::current_thread_id;
use parking_lot::lock_api::RawMutex as _;
use parking_lot::RawMutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, warn};

const NO_OWNER: u64 = 0;

/// Error-checking mutual-exclusion lock
///
/// Carries no data: it protects whatever the caller decides it protects.
/// Use [`SysMutex::guard`] for a scoped critical section.
///
/// # Example
///
/// ```
/// use platform_sync::SysMutex;
///
/// let mutex = SysMutex::new();
/// assert!(mutex.lock(false));
/// assert!(mutex.lock_checked(true).is_err()); // re-lock by owner
/// mutex.unlock();
/// ```
pub struct SysMutex {
    raw: RawMutex,
    owner: AtomicU64,
    spin_duration: Duration,
    max_spins: u32,
}

impl SysMutex {
    /// Create an unlocked mutex with default spin settings
    pub fn new() -> Self {
        Self::with_config(&SyncConfig::default())
    }

    /// Create an unlocked mutex spinning per `config` before parking
    pub fn with_config(config: &SyncConfig) -> Self {
        Self {
            raw: RawMutex::INIT,
            owner: AtomicU64::new(NO_OWNER),
            spin_duration: config.spin_duration,
            max_spins: config.max_spins,
        }
    }

    /// Acquire the lock
    ///
    /// Non-blocking mode returns `false` immediately on contention. Blocking
    /// mode tries once, spins, then parks, and returns `true`.
    ///
    /// The one exception: a re-lock by the thread that already owns the
    /// mutex returns `false` in both modes, even when `blocking` is set.
    /// The lock stays held once, by its owner, and the rejection is logged.
    /// Use [`SysMutex::lock_checked`] to get it as `MutexError::Relock`.
    pub fn lock(&self, blocking: bool) -> bool {
        match self.lock_checked(blocking) {
            Ok(acquired) => acquired,
            Err(e) => {
                error!(error = %e, "Mutex lock rejected");
                false
            }
        }
    }

    /// Acquire the lock, reporting a re-lock by the owner as an error
    pub fn lock_checked(&self, blocking: bool) -> MutexResult<bool> {
        let me = current_thread_id().as_u64();

        // Only this thread can have stored its own id
        if self.owner.load(Ordering::Acquire) == me {
            return Err(MutexError::Relock { owner: me });
        }

        if self.raw.try_lock() {
            self.owner.store(me, Ordering::Release);
            return Ok(true);
        }

        if !blocking {
            return Ok(false);
        }

        if !self.spin_acquire() {
            self.raw.lock();
        }
        self.owner.store(me, Ordering::Release);
        Ok(true)
    }

    /// Release the lock
    ///
    /// Releasing a mutex the caller does not own is a contract violation:
    /// asserted in debug builds, logged and ignored in release builds.
    pub fn unlock(&self) {
        if let Err(e) = self.unlock_checked() {
            debug_assert!(false, "{}", e);
            error!(error = %e, "Mutex unlock rejected");
        }
    }

    /// Release the lock, reporting a release by a non-owner as an error
    pub fn unlock_checked(&self) -> MutexResult<()> {
        let me = current_thread_id().as_u64();
        let owner = self.owner.load(Ordering::Acquire);

        if owner != me {
            return Err(MutexError::NotOwner {
                caller: me,
                owner: (owner != NO_OWNER).then_some(owner),
            });
        }

        self.owner.store(NO_OWNER, Ordering::Release);
        // SAFETY: the owner check above proves this thread holds the lock.
        unsafe { self.raw.unlock() };
        Ok(())
    }

    /// Blocking scoped critical section; released when the guard drops
    pub fn guard(&self) -> MutexResult<SysMutexGuard<'_>> {
        self.lock_checked(true)?;
        Ok(SysMutexGuard { mutex: self })
    }

    /// Non-blocking scoped critical section
    pub fn try_guard(&self) -> Option<SysMutexGuard<'_>> {
        match self.lock_checked(false) {
            Ok(true) => Some(SysMutexGuard { mutex: self }),
            _ => None,
        }
    }

    /// Whether any thread holds the lock (diagnostic)
    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Whether the calling thread holds the lock
    pub fn is_owned_by_current_thread(&self) -> bool {
        self.owner.load(Ordering::Acquire) == current_thread_id().as_u64()
    }

    /// Bounded optimistic phase before parking
    ///
    /// Returns true if the lock was acquired while spinning
    fn spin_acquire(&self) -> bool {
        let start = Instant::now();

        for spin in 0..self.max_spins {
            if self.raw.try_lock() {
                return true;
            }
            if start.elapsed() >= self.spin_duration {
                break;
            }
            // Yield to scheduler occasionally
            if spin % 10 == 9 {
                thread::yield_now();
            } else {
                std::hint::spin_loop();
            }
        }

        false
    }
}

impl Default for SysMutex {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SysMutex {
    fn drop(&mut self) {
        if self.raw.is_locked() {
            warn!(
                owner = self.owner.load(Ordering::Relaxed),
                "Mutex destroyed while still held"
            );
        }
    }
}

impl std::fmt::Debug for SysMutex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysMutex")
            .field("locked", &self.is_locked())
            .field("owner", &self.owner.load(Ordering::Relaxed))
            .finish()
    }
}

/// Scoped critical section over a [`SysMutex`]
#[must_use = "the mutex is released as soon as the guard is dropped"]
pub struct SysMutexGuard<'a> {
    mutex: &'a SysMutex,
}

impl Drop for SysMutexGuard<'_> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}
