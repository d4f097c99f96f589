/*!
 * Platform Sync Library
 * Threads, mutexes, signals and interlocked operations for the engine
 * platform layer
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::*;
pub use crate::core::sync::{
    interlocked_add, interlocked_compare_exchange, interlocked_compare_exchange_pointer,
    interlocked_decrement, interlocked_exchange, interlocked_exchange_pointer,
    interlocked_increment, interlocked_sub, CondvarEvent, EventStrategy, FutexEvent,
    InterlockedInt, InterlockedPtr, InterlockedValue, ResetMode, Signal, StrategyType,
    SyncConfig, SysMutex, SysMutexGuard,
};
pub use crate::core::thread::{
    create_thread, current_thread_id, destroy_thread, get_current_thread_id,
    set_current_thread_name, wait_for_thread, yield_now, CoreAffinity, SysThreadId,
    ThreadHandle, ThreadPriority, ThreadSpec, WorkerThread, DEFAULT_THREAD_STACK_SIZE,
};
pub use crate::core::{
    ErrorReporter, MonotonicClock, SysContext, SysContextBuilder, TimeSource, TracingReporter,
};
pub use monitoring::{init_tracing, span_scenario, ScenarioSpan};
