/*!
 * Error Reporting Collaborators
 *
 * Fatal and warning sinks used by the platform layer when an operation
 * cannot be reported through a return value.
 */

use tracing::{error, warn};

/// Sink for failures that escape the boolean/value contract of the primitives
///
/// # Contract
///
/// - `fatal_error` never returns normally: it terminates or escalates.
/// - `warning` is for best-effort failures; execution continues.
pub trait ErrorReporter: Send + Sync {
    /// Report an unrecoverable failure (thread creation, attribute setup)
    fn fatal_error(&self, message: &str) -> !;

    /// Report a soft failure (naming, affinity)
    fn warning(&self, message: &str);
}

/// Default reporter backed by `tracing`
///
/// Fatal errors are logged at `error` level and escalated as a panic on the
/// calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn fatal_error(&self, message: &str) -> ! {
        error!(fatal = true, "{}", message);
        panic!("fatal platform error: {}", message);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }
}
