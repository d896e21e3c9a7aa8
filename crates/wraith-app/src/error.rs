//! Wraith — application error types.

use thiserror::Error;
use wraith_dispatch::EngineError;
use wraith_heartbeat::HeartbeatError;
use wraith_narrative::{NarrativeError, ScriptError};

/// Startup and shutdown errors for the binary.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The timeline script could not be loaded.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// The dispatch engine failed to start or stop.
    #[error("dispatch error: {0}")]
    Engine(#[from] EngineError),

    /// The heartbeat failed to start or stop.
    #[error("heartbeat error: {0}")]
    Heartbeat(#[from] HeartbeatError),

    /// The narrative failed to start.
    #[error("narrative error: {0}")]
    Narrative(#[from] NarrativeError),

    /// File or terminal I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
