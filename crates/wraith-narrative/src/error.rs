//! Narrative error types.

use thiserror::Error;

/// A timeline script that failed to load or validate.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The YAML document did not parse.
    #[error("script parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A playable act has no phase, or has two.
    #[error("act {act} must be scripted exactly once (found {count})")]
    PhaseCount { act: u8, count: usize },

    /// A phase names an act outside 1 through 4.
    #[error("unknown act number {0}")]
    UnknownAct(u8),

    /// A phase has zero duration.
    #[error("act {act} has zero duration")]
    EmptyDuration { act: u8 },

    /// A timeline entry has a blank tag.
    #[error("act {act} entry {index} has an empty tag")]
    EmptyTag { act: u8, index: usize },

    /// Timeline entries are not in offset order.
    #[error("act {act} entry {index} is scheduled before its predecessor")]
    Unsorted { act: u8, index: usize },

    /// An entry is scheduled at or after the phase end.
    #[error("act {act} entry {index} at {offset_ms}ms does not fall inside the {duration_ms}ms phase")]
    OutOfRange {
        act: u8,
        index: usize,
        offset_ms: u64,
        duration_ms: u64,
    },
}

/// Errors raised by the state machine itself.
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// Called outside a tokio runtime.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// `start` called while a phase is already running.
    #[error("narrative already started")]
    AlreadyStarted,

    /// `start` called after `shutdown`.
    #[error("narrative has been shut down")]
    ShutDown,
}
