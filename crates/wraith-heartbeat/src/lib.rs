//! Wraith — autonomous background scheduler ("heartbeat").
//!
//! A single background loop that sleeps for a mood-dependent interval, wakes,
//! and decides whether to emit something on its own: a single action, a short
//! burst, or an asynchronous generation request.

pub mod actions;
pub mod config;
pub mod error;
pub mod heartbeat;
pub mod interval;

pub use actions::{AutonomousAction, WakePlan, plan_wake, standard_fallback_lines};
pub use config::HeartbeatConfig;
pub use error::HeartbeatError;
pub use heartbeat::{Heartbeat, HeartbeatDeps};
pub use interval::compute_interval;
