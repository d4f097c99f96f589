/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Thread lifecycle errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ThreadError {
    #[error("Failed to spawn thread '{name}': {reason}")]
    #[diagnostic(
        code(thread::spawn_failed),
        help("The OS refused to create the execution context. Check thread limits and stack size.")
    )]
    SpawnFailed { name: String, reason: String },

    #[error("Thread '{0}' panicked before it could be joined")]
    #[diagnostic(
        code(thread::panicked),
        help("The thread function unwound. Inspect the panic message in the logs.")
    )]
    Panicked(String),

    #[error("Thread name '{name}' rejected: {reason}")]
    #[diagnostic(
        code(thread::name_rejected),
        help("Linux limits thread names to 15 bytes and forbids interior NUL bytes.")
    )]
    NameRejected { name: String, reason: String },

    #[error("Affinity hint for core {core} rejected: {reason}")]
    #[diagnostic(
        code(thread::affinity_rejected),
        help("The requested core may not exist. The OS scheduler will place the thread instead.")
    )]
    AffinityRejected { core: u16, reason: String },

    #[error("Not supported on this platform: {0}")]
    #[diagnostic(
        code(thread::unsupported),
        help("This operation is a best-effort hint with no backend on the current target.")
    )]
    Unsupported(String),
}

/// Error-checking mutex failures
#[derive(Error, Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum MutexError {
    #[error("Mutex already held by the calling thread {owner}")]
    #[diagnostic(
        code(mutex::relock),
        help("Re-locking a non-recursive mutex from its owner would deadlock. Release it first.")
    )]
    Relock { owner: u64 },

    #[error("Unlock by thread {caller} but mutex is owned by {owner:?}")]
    #[diagnostic(
        code(mutex::not_owner),
        help("Only the thread that acquired the mutex may release it.")
    )]
    NotOwner { caller: u64, owner: Option<u64> },
}

/// Worker thread management errors
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum WorkerError {
    #[error("Worker '{0}' is not running")]
    #[diagnostic(
        code(worker::not_running),
        help("The worker was stopped. Start a new worker to submit more work.")
    )]
    NotRunning(String),

    #[error("Worker '{0}' is terminating")]
    #[diagnostic(code(worker::terminating), help("Stop was already requested for this worker."))]
    Terminating(String),
}

/// Result type for thread operations
pub type ThreadResult<T> = Result<T, ThreadError>;

/// Result type for checked mutex operations
pub type MutexResult<T> = Result<T, MutexError>;
