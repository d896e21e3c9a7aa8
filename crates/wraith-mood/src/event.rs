//! Mood events and their penalty/reward magnitudes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Something the player did that moves the anger value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodEvent {
    /// The player insulted the entity.
    Insult,
    /// The player tried to close the application.
    TriedToQuit,
    /// The player closed a window the entity opened.
    ClosedWindow,
    /// The player left a prompt unanswered.
    Ignored,
    /// The player refused an instruction.
    Defied,
    /// A ritual minigame was failed.
    RitualFailed,
    /// The player apologised.
    Apology,
    /// The player said something kind.
    Compliment,
    /// The player followed an instruction.
    Obeyed,
    /// A ritual minigame was completed.
    RitualSucceeded,
}

impl MoodEvent {
    /// Every event, in table order.
    pub const ALL: [Self; 10] = [
        Self::Insult,
        Self::TriedToQuit,
        Self::ClosedWindow,
        Self::Ignored,
        Self::Defied,
        Self::RitualFailed,
        Self::Apology,
        Self::Compliment,
        Self::Obeyed,
        Self::RitualSucceeded,
    ];

    /// Signed change applied to anger: penalties are positive, rewards negative.
    #[must_use]
    pub const fn delta(self) -> i16 {
        match self {
            Self::Insult => 15,
            Self::TriedToQuit => 20,
            Self::ClosedWindow => 8,
            Self::Ignored => 5,
            Self::Defied => 10,
            Self::RitualFailed => 12,
            Self::Apology => -10,
            Self::Compliment => -8,
            Self::Obeyed => -5,
            Self::RitualSucceeded => -15,
        }
    }

    /// Wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insult => "insult",
            Self::TriedToQuit => "tried_to_quit",
            Self::ClosedWindow => "closed_window",
            Self::Ignored => "ignored",
            Self::Defied => "defied",
            Self::RitualFailed => "ritual_failed",
            Self::Apology => "apology",
            Self::Compliment => "compliment",
            Self::Obeyed => "obeyed",
            Self::RitualSucceeded => "ritual_succeeded",
        }
    }
}

impl fmt::Display for MoodEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known mood event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mood event: {0}")]
pub struct UnknownMoodEvent(pub String);

impl FromStr for MoodEvent {
    type Err = UnknownMoodEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownMoodEvent(s.to_owned()))
    }
}
