//! Narrative timing configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing of transitions between acts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    /// How long a transition may run before the watchdog completes it.
    #[serde(with = "duration_millis")]
    pub watchdog_timeout: Duration,
    /// Delay between the terminal lines and the title card.
    #[serde(with = "duration_millis")]
    pub title_card_delay: Duration,
    /// How long the title card holds before the next act starts.
    #[serde(with = "duration_millis")]
    pub title_card_hold: Duration,
    /// Upper bound on a single progress save. The story keeps going either way.
    #[serde(with = "duration_millis")]
    pub save_timeout: Duration,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            watchdog_timeout: Duration::from_secs(10),
            title_card_delay: Duration::from_secs(3),
            title_card_hold: Duration::from_secs(3),
            save_timeout: Duration::from_secs(5),
        }
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
