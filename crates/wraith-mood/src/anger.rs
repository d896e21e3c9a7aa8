//! The anger scalar and the cadence functions derived from it.

use serde::{Deserialize, Serialize};
use wraith_core::rng::DeterministicRng;

use crate::event::MoodEvent;

/// Lowest possible anger.
pub const MIN_ANGER: u8 = 0;
/// Highest possible anger.
pub const MAX_ANGER: u8 = 100;

/// Ceiling on the autonomous trigger probability, in percent.
const MAX_TRIGGER_PERCENT: f64 = 60.0;
/// Trigger probability at zero anger, in percent.
const BASE_TRIGGER_PERCENT: f64 = 10.0;

/// Scalar mood in `[MIN_ANGER, MAX_ANGER]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AngerState {
    value: u8,
}

impl AngerState {
    /// Creates a state at the given value, clamped into range.
    #[must_use]
    pub fn new(value: u8) -> Self {
        Self {
            value: value.min(MAX_ANGER),
        }
    }

    /// Current anger.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.value
    }

    /// Applies the penalty or reward for `event` and returns the new value.
    pub fn apply(&mut self, event: MoodEvent) -> u8 {
        let next = i16::from(self.value) + event.delta();
        let clamped = next.clamp(i16::from(MIN_ANGER), i16::from(MAX_ANGER));
        // In range after the clamp.
        self.value = u8::try_from(clamped).unwrap_or(MAX_ANGER);
        self.value
    }

    /// Wake-interval divisor for the current anger.
    #[must_use]
    pub fn chaos_multiplier(self) -> f64 {
        chaos_multiplier(self.value)
    }

    /// Chance, in percent, that a heartbeat wake produces an event.
    #[must_use]
    pub fn trigger_probability(self) -> f64 {
        trigger_probability(self.value)
    }

    /// Decides a heartbeat wake with a single uniform draw.
    pub fn should_trigger(self, rng: &mut dyn DeterministicRng) -> bool {
        rng.next_f64() * 100.0 < self.trigger_probability()
    }
}

/// Step function from anger to wake-interval divisor.
#[must_use]
pub fn chaos_multiplier(anger: u8) -> f64 {
    match anger {
        0..=20 => 1.0,
        21..=50 => 1.5,
        51..=80 => 2.0,
        _ => 3.0,
    }
}

/// `min(60, 10 + anger * 0.5)` percent.
#[must_use]
pub fn trigger_probability(anger: u8) -> f64 {
    (BASE_TRIGGER_PERCENT + f64::from(anger) * 0.5).min(MAX_TRIGGER_PERCENT)
}
