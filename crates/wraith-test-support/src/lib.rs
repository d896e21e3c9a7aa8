//! Shared test mocks and utilities for the Wraith liveness engine.

mod clock;
mod progress;
mod rng;
mod sink;

pub use clock::{FixedClock, ManualClock};
pub use progress::{FailingProgressStore, InMemoryProgressStore, SlowProgressStore};
pub use rng::{MockRng, SequenceRng};
pub use sink::RecordingSink;
