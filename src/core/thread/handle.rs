/*!
 * Thread Lifecycle
 * Creation, naming, waiting and destruction of joinable threads
 */

use super::platform;
use super::types::{current_thread_id, CoreAffinity, SysThreadId, ThreadPriority, ThreadSpec};
use crate::core::context::SysContext;
use crate::core::errors::{ThreadError, ThreadResult};
use crate::core::report::ErrorReporter;
use crate::core::sync::{ResetMode, Signal};
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// State shared between a handle and its running thread
struct ThreadShared {
    name: Mutex<String>,
    id: OnceLock<SysThreadId>,
    /// Present only for threads created suspended
    start_gate: Option<Signal>,
    /// Manual-reset; raised when the thread function has returned or unwound
    finished: Signal,
}

/// Raises `finished` on scope exit, including unwinding
struct FinishGuard(Arc<ThreadShared>);

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.0.finished.raise();
    }
}

/// Owned handle to a joinable thread
///
/// Dropping the handle joins the thread (resuming it first if it was created
/// suspended), so the execution context never outlives its owner.
pub struct ThreadHandle {
    join: Option<JoinHandle<()>>,
    shared: Arc<ThreadShared>,
    reporter: Arc<dyn ErrorReporter>,
}

impl ThreadHandle {
    /// Current debug name
    pub fn name(&self) -> String {
        self.shared.name.lock().clone()
    }

    /// Identifier of the thread, once it has started running
    pub fn thread_id(&self) -> Option<SysThreadId> {
        self.shared.id.get().copied()
    }

    /// Whether the thread function has returned
    pub fn is_finished(&self) -> bool {
        self.shared.finished.is_signaled()
    }

    /// Whether the thread is still held at its start gate
    pub fn is_suspended(&self) -> bool {
        self.shared
            .start_gate
            .as_ref()
            .is_some_and(|gate| !gate.is_signaled())
    }

    /// Let a suspended thread start running its function; no-op otherwise
    pub fn resume(&self) {
        if let Some(gate) = &self.shared.start_gate {
            gate.raise();
        }
    }

    /// Rename the thread (best effort; failures are warnings)
    pub fn set_name(&self, name: &str) {
        let name = platform::sanitize_name(name);
        *self.shared.name.lock() = name.clone();

        if let Some(join) = &self.join {
            if let Err(e) = platform::set_thread_name(join, &name) {
                self.reporter.warning(&e.to_string());
            }
        }
    }

    /// Block until the thread function has returned, keeping the handle
    pub fn wait(&self) {
        self.shared.finished.wait(None);
    }

    /// Join the thread and release the handle
    ///
    /// Joining a thread that already terminated succeeds immediately.
    pub fn join(mut self) -> ThreadResult<()> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> ThreadResult<()> {
        let Some(join) = self.join.take() else {
            return Ok(());
        };

        // A suspended thread would never reach its end
        self.resume();

        join.join().map_err(|_| ThreadError::Panicked(self.name()))
    }
}

impl Drop for ThreadHandle {
    fn drop(&mut self) {
        if let Err(e) = self.join_inner() {
            warn!(error = %e, "Thread ended by panic");
        }
    }
}

impl std::fmt::Debug for ThreadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadHandle")
            .field("name", &self.name())
            .field("id", &self.thread_id())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Spawn a joinable thread running `f`
///
/// Priority, affinity and stack size are applied best effort. Failure to
/// spawn goes to the context's fatal collaborator and never returns.
pub fn create_thread<F>(ctx: &SysContext, spec: ThreadSpec, f: F) -> ThreadHandle
where
    F: FnOnce() + Send + 'static,
{
    let name = platform::sanitize_name(&spec.name);
    let lifecycle_signal =
        || Signal::with_config(ResetMode::Manual, ctx.config(), ctx.clock().clone());

    let shared = Arc::new(ThreadShared {
        name: Mutex::new(name.clone()),
        id: OnceLock::new(),
        start_gate: spec.start_suspended.then(lifecycle_signal),
        finished: lifecycle_signal(),
    });

    let mut builder = thread::Builder::new().name(name.clone());
    if spec.stack_size > 0 {
        builder = builder.stack_size(spec.stack_size);
    }

    let thread_shared = shared.clone();
    let reporter = ctx.reporter().clone();
    let thread_reporter = reporter.clone();
    let priority = spec.priority;
    let affinity = spec.affinity;

    let spawned = builder.spawn(move || {
        let _finished = FinishGuard(thread_shared.clone());
        let _ = thread_shared.id.set(current_thread_id());

        apply_scheduling_hints(thread_reporter.as_ref(), priority, affinity);

        if let Some(gate) = &thread_shared.start_gate {
            gate.wait(None);
        }

        f();
    });

    let join = match spawned {
        Ok(join) => join,
        Err(e) => {
            let err = ThreadError::SpawnFailed {
                name: name.clone(),
                reason: e.to_string(),
            };
            reporter.fatal_error(&err.to_string())
        }
    };

    debug!(
        thread = %name,
        stack_size = spec.stack_size,
        suspended = spec.start_suspended,
        "Thread created"
    );

    ThreadHandle {
        join: Some(join),
        shared,
        reporter,
    }
}

fn apply_scheduling_hints(
    reporter: &dyn ErrorReporter,
    priority: ThreadPriority,
    affinity: CoreAffinity,
) {
    if priority != ThreadPriority::Normal {
        // Left to the OS scheduler; raising priority needs privileges
        debug!(?priority, "Priority hint not applied");
    }

    if let CoreAffinity::Core(core) = affinity {
        if let Err(e) = platform::set_current_thread_affinity(core) {
            reporter.warning(&e.to_string());
        }
    }
}

/// Identifier of the calling thread
pub fn get_current_thread_id() -> SysThreadId {
    current_thread_id()
}

/// Name the calling thread
pub fn set_current_thread_name(name: &str) -> ThreadResult<()> {
    platform::set_current_thread_name(&platform::sanitize_name(name))
}

/// Block until the thread's function has returned
pub fn wait_for_thread(handle: &ThreadHandle) {
    handle.wait();
}

/// Join and release a thread; `None` is a no-op
///
/// A thread that ended by panicking is reported as a warning.
pub fn destroy_thread(handle: Option<ThreadHandle>) {
    let Some(handle) = handle else {
        return;
    };

    let reporter = handle.reporter.clone();
    let name = handle.name();
    match handle.join() {
        Ok(()) => debug!(thread = %name, "Thread destroyed"),
        Err(e) => reporter.warning(&e.to_string()),
    }
}
