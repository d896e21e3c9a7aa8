//! Heartbeat error types.

use thiserror::Error;

/// Errors from starting or stopping the heartbeat loop.
#[derive(Debug, Error)]
pub enum HeartbeatError {
    /// `start` was called while the loop is already running.
    #[error("heartbeat is already running")]
    AlreadyRunning,

    /// No tokio runtime was available to spawn the loop on.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The loop did not exit within the stop bound and was aborted.
    #[error("heartbeat loop did not stop within {0:?}")]
    StopTimeout(std::time::Duration),
}
