//! Core error types.

use thiserror::Error;

/// Errors raised by the shared contracts.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A command did not match the `{action, params, speech}` schema.
    #[error("malformed command: {0}")]
    MalformedCommand(String),

    /// A persistence collaborator failed to load or save progress.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A text generation collaborator failed or timed out.
    #[error("generation error: {0}")]
    Generation(String),
}
