//! Acts and the observable narrative state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A phase of the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Act {
    /// Act 1.
    One,
    /// Act 2.
    Two,
    /// Act 3.
    Three,
    /// Act 4.
    Four,
    /// The story is over.
    Ended,
}

impl Act {
    /// The four playable acts in order.
    pub const PLAYABLE: [Self; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    /// Persisted number: 1 through 4, 5 once ended.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Ended => 5,
        }
    }

    /// Inverse of [`number`](Self::number).
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            5 => Some(Self::Ended),
            _ => None,
        }
    }

    /// The act that follows this one. `Ended` is absorbing.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::Three,
            Self::Three => Self::Four,
            Self::Four | Self::Ended => Self::Ended,
        }
    }

    /// Whether this is `Ended`.
    #[must_use]
    pub const fn is_ended(self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl std::fmt::Display for Act {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ended => f.write_str("ended"),
            other => write!(f, "act {}", other.number()),
        }
    }
}

/// Snapshot of the state machine.
///
/// `watchdog_deadline` is `Some` exactly while `transitioning` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeState {
    /// Current act.
    pub act: Act,
    /// Whether a transition is in flight.
    pub transitioning: bool,
    /// When the watchdog forces completion of the current transition.
    pub watchdog_deadline: Option<DateTime<Utc>>,
}

impl NarrativeState {
    /// Idle state at `act`.
    #[must_use]
    pub const fn at(act: Act) -> Self {
        Self {
            act,
            transitioning: false,
            watchdog_deadline: None,
        }
    }
}
