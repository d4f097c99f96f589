/*!
 * Threads
 *
 * Joinable OS threads with best-effort naming, priority and affinity hints,
 * plus persistent worker threads built on the sync primitives.
 */

mod handle;
mod platform;
mod types;
mod worker;

pub use handle::{
    create_thread, destroy_thread, get_current_thread_id, set_current_thread_name,
    wait_for_thread, ThreadHandle,
};
pub use types::{
    current_thread_id, yield_now, CoreAffinity, SysThreadId, ThreadPriority, ThreadSpec,
    DEFAULT_THREAD_STACK_SIZE,
};
pub use worker::WorkerThread;
