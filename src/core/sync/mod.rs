/*!
 * Synchronization Primitives
 *
 * Building blocks the engine's renderer, sound and network threads
 * coordinate with:
 * - Interlocked integer/pointer operations (lock-free, SeqCst)
 * - Error-checking mutex with try-lock and blocking modes
 * - Manual/auto-reset signals with optional timeout
 *
 * # Architecture
 *
 * Signals delegate to an `EventStrategy` backend chosen once at creation:
 * - Futex-based (Linux) for minimal overhead
 * - Condvar-based (cross-platform) for reliability
 *
 * Call sites never see `cfg` switches; `SyncConfig::select_strategy` is the
 * only place the platform is consulted.
 */

mod atomic;
mod condvar;
mod config;
mod futex;
mod mutex;
mod signal;
mod traits;

pub use atomic::{
    interlocked_add, interlocked_compare_exchange, interlocked_compare_exchange_pointer,
    interlocked_decrement, interlocked_exchange, interlocked_exchange_pointer,
    interlocked_increment, interlocked_sub, InterlockedInt, InterlockedPtr, InterlockedValue,
};
pub use config::{StrategyType, SyncConfig};
pub use mutex::{SysMutex, SysMutexGuard};
pub use signal::Signal;
pub use traits::{EventStrategy, ResetMode};

// Re-export specific backends for advanced users
pub use condvar::CondvarEvent;
pub use futex::FutexEvent;
