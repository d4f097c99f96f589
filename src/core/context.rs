/*!
 * Platform Context
 *
 * Explicitly constructed owner of the collaborators the primitives need:
 * sync configuration, error reporter and time source. Subsystems receive a
 * clone instead of reaching for process-wide state.
 */

use crate::core::report::{ErrorReporter, TracingReporter};
use crate::core::sync::{ResetMode, Signal, SyncConfig, SysMutex};
use crate::core::thread::{self, ThreadHandle, ThreadSpec, WorkerThread};
use crate::core::time::{MonotonicClock, TimeSource};
use std::sync::Arc;
use tracing::debug;

struct ContextInner {
    config: SyncConfig,
    reporter: Arc<dyn ErrorReporter>,
    clock: Arc<dyn TimeSource>,
}

/// Shared platform context (cheap to clone)
///
/// # Example
///
/// ```
/// use platform_sync::{destroy_thread, SysContext, ThreadSpec};
/// use std::sync::Arc;
///
/// let ctx = SysContext::new();
/// let ready = Arc::new(ctx.create_signal(true));
///
/// let raiser = ready.clone();
/// let handle = ctx.create_thread(ThreadSpec::new("loader"), move || raiser.raise());
///
/// assert!(ready.wait(None));
/// destroy_thread(Some(handle));
/// ```
#[derive(Clone)]
pub struct SysContext {
    inner: Arc<ContextInner>,
}

impl SysContext {
    /// Context with default configuration, tracing reporter and monotonic clock
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Context whose sync configuration is read from the environment
    pub fn from_env() -> Self {
        Self::builder().with_config(SyncConfig::from_env()).build()
    }

    pub fn builder() -> SysContextBuilder {
        SysContextBuilder::default()
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Fatal/warning collaborator
    pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.inner.reporter
    }

    pub fn clock(&self) -> &Arc<dyn TimeSource> {
        &self.inner.clock
    }

    /// Create a non-signaled signal
    pub fn create_signal(&self, manual_reset: bool) -> Signal {
        Signal::with_config(
            ResetMode::from_manual_reset(manual_reset),
            &self.inner.config,
            self.inner.clock.clone(),
        )
    }

    /// Create an unlocked error-checking mutex
    pub fn create_mutex(&self) -> SysMutex {
        SysMutex::with_config(&self.inner.config)
    }

    /// Spawn a joinable thread running `f`
    ///
    /// Spawn failure is reported to the fatal collaborator and does not
    /// return.
    pub fn create_thread<F>(&self, spec: ThreadSpec, f: F) -> ThreadHandle
    where
        F: FnOnce() + Send + 'static,
    {
        thread::create_thread(self, spec, f)
    }

    /// Spawn a worker thread and wait until it is idle
    pub fn start_worker<F>(&self, spec: ThreadSpec, job: F) -> WorkerThread
    where
        F: FnMut() + Send + 'static,
    {
        WorkerThread::start(self, spec, job)
    }

    /// Name the calling thread; failures go to the warning collaborator
    pub fn set_current_thread_name(&self, name: &str) {
        if let Err(e) = thread::set_current_thread_name(name) {
            self.inner.reporter.warning(&e.to_string());
        }
    }
}

impl Default for SysContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SysContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysContext")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SysContext`]
#[derive(Default)]
pub struct SysContextBuilder {
    config: Option<SyncConfig>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    clock: Option<Arc<dyn TimeSource>>,
}

impl SysContextBuilder {
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn TimeSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> SysContext {
        let config = self.config.unwrap_or_default();
        debug!(
            strategy = ?config.select_strategy(),
            max_spins = config.max_spins,
            "Platform context initialized"
        );

        SysContext {
            inner: Arc::new(ContextInner {
                config,
                reporter: self.reporter.unwrap_or_else(|| Arc::new(TracingReporter)),
                clock: self.clock.unwrap_or_else(|| Arc::new(MonotonicClock)),
            }),
        }
    }
}
