/*!
 * Core Module
 * Platform primitives, their collaborators and error types
 */

pub mod context;
pub mod errors;
pub mod report;
pub mod sync;
pub mod thread;
pub mod time;

// Re-export for convenience
pub use context::{SysContext, SysContextBuilder};
pub use errors::*;
pub use report::{ErrorReporter, TracingReporter};
pub use time::{MonotonicClock, TimeSource};
