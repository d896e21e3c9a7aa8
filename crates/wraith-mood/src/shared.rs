//! Shared handle to the mood state.
//!
//! One owner records events; any number of readers (the heartbeat, the
//! narrative ending) sample it.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;
use wraith_core::rng::DeterministicRng;

use crate::anger::AngerState;
use crate::counters::BehaviorCounters;
use crate::event::MoodEvent;

/// Point-in-time copy of the mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoodSnapshot {
    /// Anger at snapshot time.
    pub anger: AngerState,
    /// Behavior tallies at snapshot time.
    pub counters: BehaviorCounters,
}

/// Cloneable, thread-safe mood handle.
#[derive(Debug, Clone, Default)]
pub struct SharedMood {
    inner: Arc<RwLock<MoodSnapshot>>,
}

impl SharedMood {
    /// Creates a handle starting from `snapshot`.
    #[must_use]
    pub fn new(snapshot: MoodSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Applies `event` to anger and tallies it. Returns the new anger.
    pub fn record(&self, event: MoodEvent) -> u8 {
        let mut mood = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = mood.anger.value();
        let after = mood.anger.apply(event);
        mood.counters.record(event);
        debug!(event = %event, before, after, "mood event recorded");
        after
    }

    /// Current anger value.
    #[must_use]
    pub fn anger(&self) -> u8 {
        self.snapshot().anger.value()
    }

    /// Current wake-interval divisor.
    #[must_use]
    pub fn chaos_multiplier(&self) -> f64 {
        self.snapshot().anger.chaos_multiplier()
    }

    /// Anger-weighted coin flip for a heartbeat wake.
    pub fn should_trigger(&self, rng: &mut dyn DeterministicRng) -> bool {
        self.snapshot().anger.should_trigger(rng)
    }

    /// Copies the current state.
    #[must_use]
    pub fn snapshot(&self) -> MoodSnapshot {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}
