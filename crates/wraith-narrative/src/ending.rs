//! Outcome of a finished playthrough.

use serde::{Deserialize, Serialize};
use wraith_mood::{BehaviorCounters, MoodSnapshot};

/// Anger at or above which the story always ends badly.
pub const CONSUMED_ANGER: u8 = 80;
/// Anger at or below which a kind player is let go.
pub const RELEASED_ANGER: u8 = 30;

/// How the story ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ending {
    /// The entity lets the player go.
    Released,
    /// An uneasy truce.
    Bargain,
    /// The entity takes over.
    Consumed,
}

impl Ending {
    /// Picks the ending from final anger and behavior tallies.
    ///
    /// Hostility and quit attempts weigh against the player (quits count
    /// double); kindness and compliance weigh for them.
    #[must_use]
    pub fn decide(anger: u8, counters: &BehaviorCounters) -> Self {
        let against = u64::from(counters.hostility)
            + u64::from(counters.defiance)
            + 2 * u64::from(counters.quit_attempts);
        let favour = u64::from(counters.kindness) + u64::from(counters.compliance);

        if anger >= CONSUMED_ANGER || against > favour + 5 {
            Self::Consumed
        } else if anger <= RELEASED_ANGER && favour >= against {
            Self::Released
        } else {
            Self::Bargain
        }
    }

    /// [`decide`](Self::decide) applied to a mood snapshot.
    #[must_use]
    pub fn from_mood(mood: &MoodSnapshot) -> Self {
        Self::decide(mood.anger.value(), &mood.counters)
    }
}

impl std::fmt::Display for Ending {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Released => "released",
            Self::Bargain => "bargain",
            Self::Consumed => "consumed",
        })
    }
}
