//! Running tallies of player behavior used to choose an ending.

use serde::{Deserialize, Serialize};

use crate::event::MoodEvent;

/// Counts of each behavior class observed during a playthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BehaviorCounters {
    /// Instructions followed and rituals completed.
    pub compliance: u32,
    /// Refusals, ignored prompts, closed windows and failed rituals.
    pub defiance: u32,
    /// Apologies and compliments.
    pub kindness: u32,
    /// Insults.
    pub hostility: u32,
    /// Attempts to quit.
    pub quit_attempts: u32,
}

impl BehaviorCounters {
    /// Tallies one event.
    pub fn record(&mut self, event: MoodEvent) {
        let slot = match event {
            MoodEvent::Obeyed | MoodEvent::RitualSucceeded => &mut self.compliance,
            MoodEvent::Defied
            | MoodEvent::Ignored
            | MoodEvent::ClosedWindow
            | MoodEvent::RitualFailed => &mut self.defiance,
            MoodEvent::Apology | MoodEvent::Compliment => &mut self.kindness,
            MoodEvent::Insult => &mut self.hostility,
            MoodEvent::TriedToQuit => &mut self.quit_attempts,
        };
        *slot = slot.saturating_add(1);
    }
}
