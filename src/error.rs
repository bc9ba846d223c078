//! Crate-wide error type.
//!
//! Every operation exposed on [`crate::runtime::Runtime`] returns
//! `Result<T, ThreadError>`. Call sites that only need to propagate an error
//! (rather than match on its kind) can convert through `?` into
//! [`AppResult`], which boxes any error behind `anyhow`.

use thiserror::Error;

/// Errors produced by the actor runtime, sync primitives, and shared
/// variable store.
#[derive(Debug, Error)]
pub enum ThreadError {
    /// `send`/`transfer`/`preserve`/`release` referenced an unknown actor id.
    #[error("invalid thread id: {0}")]
    InvalidTarget(u64),

    /// A synchronous send's peer exited before the job completed.
    #[error("target thread died")]
    TargetDied,

    /// `tpool get` referenced a job id with no completion entry.
    #[error("no such job: {0}")]
    NoSuchJob(u64),

    /// `tpool get` referenced a job id that has not completed yet.
    #[error("job not completed: {0}")]
    NotCompleted(u64),

    /// `tpool ...` referenced an unknown pool handle.
    #[error("invalid thread pool: {0}")]
    InvalidPool(String),

    /// A condvar wait or locked-eval was given a handle of the wrong kind.
    #[error("wrong mutex type for handle {0}")]
    WrongMutexType(String),

    /// A condvar wait was given a mutex handle that was never locked.
    #[error("mutex never locked: {0}")]
    MutexNeverLocked(String),

    /// A sync-primitive handle did not resolve to any registered object.
    #[error("no such handle: {0}")]
    NoSuchHandle(String),

    /// `thread::transfer` target already has a channel of that name.
    #[error("channel already exists: {0}")]
    ChannelExists(String),

    /// `thread::transfer` source channel is not registered in its interpreter.
    #[error("channel not registered: {0}")]
    ChannelNotRegistered(String),

    /// `thread::transfer` source channel is shared between interpreters.
    #[error("channel is shared: {0}")]
    ChannelShared(String),

    /// A shared-variable `get`/`unset`/list op referenced a missing array or key.
    #[error("not found: {0}")]
    NotFound(String),

    /// A shared-variable numeric op could not parse the current value.
    #[error("not a number: {0}")]
    NotANumber(String),

    /// An index argument was not an integer or a recognized `end`/`end-N` form.
    #[error("bad index: {0}")]
    BadIndex(String),

    /// A script evaluated by the target interpreter failed; `code` and
    /// `info` preserve the target's errorCode/errorInfo for propagation.
    #[error("script error [{code}]: {message}")]
    ScriptError {
        /// The interpreter's errorCode string.
        code: String,
        /// The interpreter's errorInfo string.
        info: String,
        /// Human-readable message (interpreter's result string).
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation was attempted on an actor/pool that is winding down.
    #[error("shutting down")]
    ShuttingDown,

    /// A blocking wait exceeded its deadline.
    #[error("operation timed out")]
    Timeout,
}

/// Convenience alias for call sites that only need `?`-propagation.
pub type AppResult<T> = Result<T, anyhow::Error>;
