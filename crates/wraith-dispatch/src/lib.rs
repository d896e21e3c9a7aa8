//! Wraith — priority dispatch engine.
//!
//! Every action in the system passes through [`engine::DispatchEngine`]: a
//! fixed pool of workers draining a `(tier, sequence)`-ordered queue and
//! routing each command to the handler registered for its category.

pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
mod queue;
pub mod registry;

pub use config::DispatchConfig;
pub use engine::{DispatchEngine, EngineStats, Submission};
pub use error::{EngineError, HandlerError};
pub use handler::{ActionHandler, HandlerSet, SpeechRenderer};
pub use registry::{ActionRegistry, HandlerCategory};
