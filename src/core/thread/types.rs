/*!
 * Thread Types
 * Identifiers, scheduling hints and creation parameters
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default stack size for engine threads (256 KiB)
pub const DEFAULT_THREAD_STACK_SIZE: usize = 256 * 1024;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static CURRENT_THREAD_ID: SysThreadId =
        SysThreadId(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed));
}

/// Identifier of an execution context, usable for comparison and logging
///
/// Assigned lazily the first time a thread asks for it. Never zero; not
/// stable across process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SysThreadId(u64);

impl SysThreadId {
    /// Raw numeric value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SysThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the calling thread
#[inline]
pub fn current_thread_id() -> SysThreadId {
    CURRENT_THREAD_ID.with(|id| *id)
}

/// Cooperative hint to let another ready thread run
#[inline]
pub fn yield_now() {
    std::thread::yield_now();
}

/// Scheduling priority hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadPriority {
    Lowest,
    BelowNormal,
    #[default]
    Normal,
    AboveNormal,
    Highest,
}

/// Core placement hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoreAffinity {
    /// Let the OS scheduler decide
    #[default]
    Any,
    /// Prefer a specific logical core
    Core(u16),
}

/// Parameters for creating a thread
///
/// Priority, affinity and stack size are hints; a backend may ignore them.
///
/// # Example
///
/// ```
/// use platform_sync::{CoreAffinity, ThreadPriority, ThreadSpec};
///
/// let spec = ThreadSpec::new("sound")
///     .with_priority(ThreadPriority::AboveNormal)
///     .with_affinity(CoreAffinity::Core(1))
///     .suspended();
/// assert!(spec.start_suspended);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSpec {
    pub name: String,
    pub priority: ThreadPriority,
    pub affinity: CoreAffinity,
    pub stack_size: usize,
    pub start_suspended: bool,
}

impl ThreadSpec {
    /// Spec with default hints
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            priority: ThreadPriority::Normal,
            affinity: CoreAffinity::Any,
            stack_size: DEFAULT_THREAD_STACK_SIZE,
            start_suspended: false,
        }
    }

    pub fn with_priority(mut self, priority: ThreadPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_affinity(mut self, affinity: CoreAffinity) -> Self {
        self.affinity = affinity;
        self
    }

    /// Stack size in bytes; 0 selects the platform default
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Do not run the thread function until `ThreadHandle::resume`
    pub fn suspended(mut self) -> Self {
        self.start_suspended = true;
        self
    }
}

impl Default for ThreadSpec {
    fn default() -> Self {
        Self::new("thread")
    }
}
