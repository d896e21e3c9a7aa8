//! Wraith — mood model.
//!
//! A single anger scalar in `[0, 100]` moved by a fixed penalty/reward table,
//! plus the cadence functions the heartbeat derives from it.

pub mod anger;
pub mod counters;
pub mod event;
pub mod shared;

pub use anger::{AngerState, MAX_ANGER, MIN_ANGER, chaos_multiplier, trigger_probability};
pub use counters::BehaviorCounters;
pub use event::{MoodEvent, UnknownMoodEvent};
pub use shared::{MoodSnapshot, SharedMood};
