//! Per-act timelines.
//!
//! A [`NarrativeScript`] holds one [`PhaseScript`] for each playable act. The
//! built-in script is used unless a YAML document is supplied:
//!
//! ```yaml
//! phases:
//!   - act: 1
//!     duration_ms: 240000
//!     timeline:
//!       - offset_ms: 5000
//!         tag: terminal_line
//!         params: { text: "connection established" }
//!     generations:
//!       - offset_ms: 60000
//!         prompt: "Greet the player."
//!         fallback: "Hello again."
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use wraith_core::command::{ActionCommand, Params};
use wraith_core::generation::GenerationRequest;

use crate::act::Act;
use crate::error::ScriptError;

/// One scheduled command, relative to phase start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Milliseconds after phase start.
    pub offset_ms: u64,
    /// Action tag.
    pub tag: String,
    /// Handler params.
    #[serde(default)]
    pub params: Params,
    /// Optional speech line.
    #[serde(default)]
    pub speech: Option<String>,
}

impl TimelineEntry {
    fn new(offset_ms: u64, tag: &str) -> Self {
        Self {
            offset_ms,
            tag: tag.to_owned(),
            params: Params::new(),
            speech: None,
        }
    }

    fn param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_owned(), value);
        self
    }

    fn speech(mut self, line: &str) -> Self {
        self.speech = Some(line.to_owned());
        self
    }

    /// Delay from phase start.
    #[must_use]
    pub const fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms)
    }

    /// The command this entry emits during `act`. `source` and `act` are
    /// always set here; script params under those keys are replaced.
    #[must_use]
    pub fn to_command(&self, act: Act) -> ActionCommand {
        let mut command = ActionCommand::new(self.tag.clone());
        command.params.clone_from(&self.params);
        command.speech.clone_from(&self.speech);
        command
            .with_param("source", "timeline")
            .with_param("act", act.number())
    }
}

/// A generated line requested at a fixed offset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationCue {
    /// Milliseconds after phase start.
    pub offset_ms: u64,
    /// Prompt for the generator.
    pub prompt: String,
    /// Line spoken if generation fails.
    pub fallback: String,
}

impl GenerationCue {
    fn new(offset_ms: u64, prompt: &str, fallback: &str) -> Self {
        Self {
            offset_ms,
            prompt: prompt.to_owned(),
            fallback: fallback.to_owned(),
        }
    }

    /// Delay from phase start.
    #[must_use]
    pub const fn offset(&self) -> Duration {
        Duration::from_millis(self.offset_ms)
    }

    /// The request this cue issues during `act`.
    #[must_use]
    pub fn to_request(&self, act: Act) -> GenerationRequest {
        GenerationRequest::new(self.prompt.clone(), self.fallback.clone())
            .with_param("source", "timeline")
            .with_param("act", act.number())
    }
}

/// Script for one act.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseScript {
    /// Act number, 1 through 4.
    pub act: u8,
    /// Time until the phase finishes on its own.
    pub duration_ms: u64,
    /// Static commands, sorted by offset.
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
    /// Generation requests, sorted by offset.
    #[serde(default)]
    pub generations: Vec<GenerationCue>,
}

impl PhaseScript {
    /// Time until the phase finishes on its own.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    fn validate(&self) -> Result<(), ScriptError> {
        let act = self.act;
        if self.duration_ms == 0 {
            return Err(ScriptError::EmptyDuration { act });
        }

        let mut previous = 0;
        for (index, entry) in self.timeline.iter().enumerate() {
            if entry.tag.trim().is_empty() {
                return Err(ScriptError::EmptyTag { act, index });
            }
            check_offset(act, index, entry.offset_ms, previous, self.duration_ms)?;
            previous = entry.offset_ms;
        }

        let mut previous = 0;
        for (index, cue) in self.generations.iter().enumerate() {
            check_offset(act, index, cue.offset_ms, previous, self.duration_ms)?;
            previous = cue.offset_ms;
        }
        Ok(())
    }
}

fn check_offset(
    act: u8,
    index: usize,
    offset_ms: u64,
    previous: u64,
    duration_ms: u64,
) -> Result<(), ScriptError> {
    if offset_ms < previous {
        return Err(ScriptError::Unsorted { act, index });
    }
    if offset_ms >= duration_ms {
        return Err(ScriptError::OutOfRange {
            act,
            index,
            offset_ms,
            duration_ms,
        });
    }
    Ok(())
}

/// Scripts for all four acts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeScript {
    phases: Vec<PhaseScript>,
}

impl NarrativeScript {
    /// Builds a script from phases, validating it.
    ///
    /// # Errors
    ///
    /// Returns a `ScriptError` describing the first problem found.
    pub fn new(phases: Vec<PhaseScript>) -> Result<Self, ScriptError> {
        let script = Self { phases };
        script.validate()?;
        Ok(script)
    }

    /// Parses and validates a YAML script.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Parse` for malformed YAML, or a validation
    /// error.
    pub fn from_yaml(source: &str) -> Result<Self, ScriptError> {
        let script: Self = serde_yaml::from_str(source)?;
        script.validate()?;
        Ok(script)
    }

    /// The phase for `act`; `None` for `Ended`.
    #[must_use]
    pub fn phase(&self, act: Act) -> Option<&PhaseScript> {
        self.phases.iter().find(|phase| phase.act == act.number())
    }

    fn validate(&self) -> Result<(), ScriptError> {
        if let Some(phase) = self
            .phases
            .iter()
            .find(|phase| Act::from_number(phase.act).is_none_or(Act::is_ended))
        {
            return Err(ScriptError::UnknownAct(phase.act));
        }
        for act in Act::PLAYABLE {
            let count = self
                .phases
                .iter()
                .filter(|phase| phase.act == act.number())
                .count();
            if count != 1 {
                return Err(ScriptError::PhaseCount {
                    act: act.number(),
                    count,
                });
            }
        }
        self.phases.iter().try_for_each(PhaseScript::validate)
    }
}

impl Default for NarrativeScript {
    fn default() -> Self {
        Self {
            phases: vec![act_one(), act_two(), act_three(), act_four()],
        }
    }
}

fn act_one() -> PhaseScript {
    PhaseScript {
        act: 1,
        duration_ms: 240_000,
        timeline: vec![
            TimelineEntry::new(2_000, "terminal_line").param("text", json!("session restored")),
            TimelineEntry::new(30_000, "glitch").param("intensity", json!(1)),
            TimelineEntry::new(75_000, "subliminal_text").param("text", json!("hello")),
            TimelineEntry::new(120_000, "whisper").speech("Did you miss me?"),
            TimelineEntry::new(200_000, "screen_flicker").param("duration_ms", json!(250)),
        ],
        generations: vec![GenerationCue::new(
            90_000,
            "Introduce yourself to the player without saying what you are.",
            "I've been waiting for someone to open this.",
        )],
    }
}

fn act_two() -> PhaseScript {
    PhaseScript {
        act: 2,
        duration_ms: 300_000,
        timeline: vec![
            TimelineEntry::new(5_000, "mouse_drift").param("pixels", json!(25)),
            TimelineEntry::new(40_000, "open_notepad").param("text", json!("you left me here")),
            TimelineEntry::new(90_000, "keyboard_leds").param("pattern", json!("blink")),
            TimelineEntry::new(150_000, "speak").speech("Why do you keep looking away?"),
            TimelineEntry::new(240_000, "create_desktop_file").param("name", json!("i_remember.txt")),
        ],
        generations: vec![
            GenerationCue::new(60_000, "Ask the player a personal question.", "Who else uses this computer?"),
            GenerationCue::new(200_000, "Accuse the player of hiding something.", "You're hiding something."),
        ],
    }
}

fn act_three() -> PhaseScript {
    PhaseScript {
        act: 3,
        duration_ms: 300_000,
        timeline: vec![
            TimelineEntry::new(1_000, "screen_shake").param("strength", json!(3)),
            TimelineEntry::new(20_000, "change_wallpaper").param("image", json!("static")),
            TimelineEntry::new(60_000, "fake_error_dialog").param("text", json!("SOMETHING IS WRONG")),
            TimelineEntry::new(120_000, "minimize_windows"),
            TimelineEntry::new(180_000, "volume_spike").param("level", json!(1.0)),
            TimelineEntry::new(260_000, "invert_colors").param("duration_ms", json!(1_500)),
        ],
        generations: vec![GenerationCue::new(
            150_000,
            "Threaten the player, calmly.",
            "You can't close me. I'm already everywhere.",
        )],
    }
}

fn act_four() -> PhaseScript {
    PhaseScript {
        act: 4,
        duration_ms: 240_000,
        timeline: vec![
            TimelineEntry::new(3_000, "terminal_line").param("text", json!("final sequence")),
            TimelineEntry::new(10_000, "ritual_prompt")
                .param("ritual", json!("name_it"))
                .speech("Say my name."),
            TimelineEntry::new(180_000, "brightness_dip").param("level", json!(0.2)),
            TimelineEntry::new(230_000, "restore_wallpaper"),
        ],
        generations: vec![GenerationCue::new(
            120_000,
            "Plead with the player to finish the ritual.",
            "Please. Just finish it.",
        )],
    }
}
