//! Dispatch error types.

use thiserror::Error;

/// Errors raised by the engine itself. Command-level failures never surface
/// here; they are logged where they happen.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was configured with invalid values.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No tokio runtime was available to spawn workers on.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Workers were still alive when the join bound elapsed.
    #[error("{alive} worker(s) still alive after shutdown timeout")]
    ShutdownTimeout {
        /// Workers that had not exited.
        alive: usize,
    },
}

/// Errors a handler may return for a single command.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The command's params did not fit the handler's parameter set.
    #[error("invalid params for '{tag}': {reason}")]
    InvalidParams {
        /// The offending tag.
        tag: String,
        /// What was wrong.
        reason: String,
    },

    /// The collaborator behind the handler is not available.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    /// The handler ran but failed.
    #[error("handler failed: {0}")]
    Failed(String),
}
