//! Events published by the state machine.

use serde::{Deserialize, Serialize};

use crate::act::Act;
use crate::ending::Ending;

/// Lifecycle notifications, published on the narrative event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NarrativeEvent {
    /// An act's timeline began.
    PhaseStarted { act: Act },
    /// An act finished and the transition sequence began.
    TransitionStarted { from: Act, to: Act },
    /// The watchdog completed a transition the driver did not finish.
    WatchdogFired { from: Act, to: Act },
    /// The act changed.
    PhaseAdvanced { from: Act, to: Act },
    /// The story is over.
    Ended { ending: Ending },
}

impl NarrativeEvent {
    /// Short event name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PhaseStarted { .. } => "narrative.phase_started",
            Self::TransitionStarted { .. } => "narrative.transition_started",
            Self::WatchdogFired { .. } => "narrative.watchdog_fired",
            Self::PhaseAdvanced { .. } => "narrative.phase_advanced",
            Self::Ended { .. } => "narrative.ended",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = NarrativeEvent::PhaseAdvanced {
            from: Act::Two,
            to: Act::Three,
        };

        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "type": "phase_advanced", "from": "two", "to": "three" })
        );
        assert_eq!(event.name(), "narrative.phase_advanced");
    }
}
