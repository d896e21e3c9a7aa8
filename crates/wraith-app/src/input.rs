//! Player input lines read by the binary.
//!
//! One line per input:
//! - a mood event name (`insult`, `apology`, ...);
//! - `ritual pass` / `ritual fail`;
//! - a raw command object (`{"action": "glitch", ...}`);
//! - `quit`.
//!
//! Anything else still counts as player activity.

use serde_json::{Value, json};
use wraith_mood::MoodEvent;

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerInput {
    /// Record a mood event.
    Mood(MoodEvent),
    /// Submit a command in wire form.
    Command(Value),
    /// Leave.
    Quit,
    /// Nothing specific; the player is just there.
    Activity,
    /// A line that looked like a command but was not valid JSON.
    Invalid(String),
}

/// Parses one line.
#[must_use]
pub fn parse(line: &str) -> PlayerInput {
    let line = line.trim();
    if line.starts_with('{') {
        return serde_json::from_str(line)
            .map_or_else(|e| PlayerInput::Invalid(e.to_string()), PlayerInput::Command);
    }

    let lowered = line.to_ascii_lowercase();
    match lowered.as_str() {
        "quit" | "exit" => PlayerInput::Quit,
        "ritual pass" => ritual(true),
        "ritual fail" => ritual(false),
        word => word
            .replace(' ', "_")
            .parse::<MoodEvent>()
            .map_or(PlayerInput::Activity, PlayerInput::Mood),
    }
}

fn ritual(success: bool) -> PlayerInput {
    PlayerInput::Command(json!({
        "action": "ritual_result",
        "params": { "success": success }
    }))
}
