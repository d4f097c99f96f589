/*!
 * Worker Threads
 *
 * A persistent thread that sleeps until work is signaled, runs its job, and
 * reports completion. Built only from the platform primitives: an auto-reset
 * "work available" signal, a manual-reset "work done" signal and a mutex
 * serializing the hand-off flags.
 */

use super::handle::{create_thread, ThreadHandle};
use super::types::ThreadSpec;
use crate::core::context::SysContext;
use crate::core::errors::WorkerError;
use crate::core::sync::{InterlockedInt, InterlockedValue, Signal, SysMutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

struct WorkerShared {
    name: String,
    work_available: Signal,
    work_done: Signal,
    /// Serializes the flag + signal hand-off between requester and worker
    lock: SysMutex,
    more_work: AtomicBool,
    terminating: AtomicBool,
    running: AtomicBool,
    runs: InterlockedInt,
}

impl WorkerShared {
    fn with_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        self.lock.lock(true);
        let result = f();
        self.lock.unlock();
        result
    }

    /// Worker side: idle until signaled, run once per request
    fn run<F: FnMut()>(&self, mut job: F) {
        loop {
            let has_work = self.with_lock(|| {
                if self.more_work.swap(false, Ordering::Relaxed) {
                    true
                } else {
                    self.work_done.raise();
                    false
                }
            });

            if !has_work {
                self.work_available.wait(None);
                continue;
            }

            if self.terminating.load(Ordering::Acquire) {
                break;
            }

            job();
            self.runs.increment();
        }
    }
}

/// Marks the worker stopped and releases `work_done` waiters, even if the
/// job unwinds
struct ExitGuard(Arc<WorkerShared>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        // Under the lock, so a concurrent `signal_work` either sees the
        // worker stopped or its clear of `work_done` happens before this raise
        self.0.with_lock(|| {
            self.0.running.store(false, Ordering::Release);
            self.0.work_done.raise();
        });
        debug!(worker = %self.0.name, "Worker exited");
    }
}

/// Persistent worker thread
///
/// # Example
///
/// ```
/// use platform_sync::{InterlockedInt, SysContext, ThreadSpec};
/// use std::sync::Arc;
///
/// let ctx = SysContext::new();
/// let frames = Arc::new(InterlockedInt::new(0));
/// let f = frames.clone();
///
/// let mut worker = ctx.start_worker(ThreadSpec::new("frame"), move || {
///     f.increment();
/// });
/// worker.signal_work().unwrap();
/// worker.wait_for_work_done();
/// assert_eq!(frames.get(), 1);
/// worker.stop(true);
/// ```
pub struct WorkerThread {
    shared: Arc<WorkerShared>,
    handle: Option<ThreadHandle>,
}

impl WorkerThread {
    /// Spawn the worker and block until it is idle
    ///
    /// The worker always starts immediately; a suspended spec is ignored.
    pub fn start<F>(ctx: &SysContext, mut spec: ThreadSpec, job: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        spec.start_suspended = false;

        let shared = Arc::new(WorkerShared {
            name: spec.name.clone(),
            work_available: ctx.create_signal(false),
            work_done: ctx.create_signal(true),
            lock: ctx.create_mutex(),
            more_work: AtomicBool::new(false),
            terminating: AtomicBool::new(false),
            running: AtomicBool::new(true),
            runs: InterlockedInt::new(0),
        });

        let thread_shared = shared.clone();
        let handle = create_thread(ctx, spec, move || {
            let _exit = ExitGuard(thread_shared.clone());
            thread_shared.run(job);
        });

        shared.work_done.wait(None);
        info!(worker = %shared.name, "Worker started");

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Request one run of the job
    ///
    /// If a run is in progress, exactly one more run follows it; further
    /// requests before that run starts collapse into it.
    pub fn signal_work(&self) -> Result<(), WorkerError> {
        let shared = &self.shared;
        shared.with_lock(|| {
            if shared.terminating.load(Ordering::Acquire) {
                return Err(WorkerError::Terminating(shared.name.clone()));
            }
            if !shared.running.load(Ordering::Acquire) {
                return Err(WorkerError::NotRunning(shared.name.clone()));
            }

            shared.more_work.store(true, Ordering::Relaxed);
            shared.work_done.clear();
            shared.work_available.raise();
            Ok(())
        })
    }

    /// Non-blocking check whether all requested work has completed
    pub fn is_work_done(&self) -> bool {
        self.shared.work_done.wait_millis(0)
    }

    /// Block until all requested work has completed
    pub fn wait_for_work_done(&self) {
        self.shared.work_done.wait(None);
    }

    /// Block up to `timeout` for completion; `false` on timeout
    pub fn wait_for_work_done_timeout(&self, timeout: Duration) -> bool {
        self.shared.work_done.wait(Some(timeout))
    }

    /// Ask the worker to exit after any run in progress
    ///
    /// With `wait`, blocks until the thread has terminated and joins it.
    pub fn stop(&mut self, wait: bool) {
        let shared = &self.shared;
        let requested = shared.with_lock(|| {
            if !shared.running.load(Ordering::Acquire) || shared.terminating.load(Ordering::Acquire) {
                return false;
            }
            shared.more_work.store(true, Ordering::Relaxed);
            shared.work_done.clear();
            shared.terminating.store(true, Ordering::Release);
            shared.work_available.raise();
            true
        });
        if requested {
            debug!(worker = %shared.name, "Worker stop requested");
        }

        if wait {
            if let Some(handle) = self.handle.take() {
                if let Err(e) = handle.join() {
                    warn!(error = %e, "Worker ended by panic");
                }
            }
        }
    }

    /// Whether the worker thread is still alive
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Completed job runs
    pub fn runs(&self) -> InterlockedValue {
        self.shared.runs.get()
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        self.stop(true);
    }
}

impl std::fmt::Debug for WorkerThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerThread")
            .field("name", &self.shared.name)
            .field("running", &self.is_running())
            .field("runs", &self.runs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_idle_after_start() {
        let ctx = SysContext::new();
        let worker = WorkerThread::start(&ctx, ThreadSpec::new("idle"), || {});
        assert!(worker.is_running());
        assert!(worker.is_work_done());
        assert_eq!(worker.runs(), 0);
    }

    #[test]
    fn test_each_signal_runs_job() {
        let ctx = SysContext::new();
        let worker = WorkerThread::start(&ctx, ThreadSpec::new("runs"), || {});

        for expected in 1..=5 {
            worker.signal_work().unwrap();
            worker.wait_for_work_done();
            assert_eq!(worker.runs(), expected);
        }
    }

    #[test]
    fn test_signal_during_run_queues_one_more() {
        let ctx = SysContext::new();
        let gate = Arc::new(ctx.create_signal(false));
        let job_gate = gate.clone();

        let worker = WorkerThread::start(&ctx, ThreadSpec::new("busy"), move || {
            job_gate.wait(Some(Duration::from_secs(5)));
        });

        worker.signal_work().unwrap();
        // Collapse into a single follow-up run
        worker.signal_work().unwrap();
        worker.signal_work().unwrap();
        assert!(!worker.is_work_done());

        gate.raise();
        gate.raise();
        assert!(worker.wait_for_work_done_timeout(Duration::from_secs(10)));
        assert!(worker.runs() >= 1 && worker.runs() <= 2);
    }

    #[test]
    fn test_stop_rejects_further_work() {
        let ctx = SysContext::new();
        let mut worker = WorkerThread::start(&ctx, ThreadSpec::new("stopper"), || {});

        worker.stop(true);
        assert!(!worker.is_running());
        assert!(worker.is_work_done());
        assert!(matches!(worker.signal_work(), Err(WorkerError::Terminating(_))));
    }
}
