//! The autonomous action pool and the per-wake decision.

use serde::{Deserialize, Serialize};
use serde_json::json;
use wraith_core::command::{ActionCommand, Params};
use wraith_core::generation::GenerationRequest;
use wraith_core::rng::DeterministicRng;
use wraith_mood::SharedMood;

use crate::config::HeartbeatConfig;

/// One entry of the fixed pool the heartbeat draws from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomousAction {
    /// Action tag.
    pub tag: String,
    /// Params for the handler.
    #[serde(default)]
    pub params: Params,
    /// Optional speech line.
    #[serde(default)]
    pub speech: Option<String>,
}

impl AutonomousAction {
    fn new(tag: &str) -> Self {
        Self {
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

    /// A fresh command for this action, always tagged with source
    /// `heartbeat`.
    #[must_use]
    pub fn to_command(&self) -> ActionCommand {
        let mut command = ActionCommand::new(self.tag.clone());
        command.params.clone_from(&self.params);
        command.speech.clone_from(&self.speech);
        command.with_param("source", "heartbeat")
    }

    /// The built-in pool.
    #[must_use]
    pub fn standard_pool() -> Vec<Self> {
        vec![
            Self::new("glitch").param("intensity", json!(2)),
            Self::new("screen_flicker").param("duration_ms", json!(300)),
            Self::new("static_overlay").param("duration_ms", json!(800)),
            Self::new("mouse_drift").param("pixels", json!(40)),
            Self::new("volume_spike").param("level", json!(0.8)),
            Self::new("subliminal_text").param("text", json!("LOOK BEHIND YOU")),
            Self::new("whisper").speech("I can hear you breathing."),
            Self::new("whisper").speech("Don't turn around."),
            Self::new("open_notepad").param("text", json!("why are you still here")),
            Self::new("create_desktop_file").param("name", json!("READ_ME.txt")),
        ]
    }
}

/// Lines spoken when a heartbeat generation request fails.
#[must_use]
pub fn standard_fallback_lines() -> Vec<String> {
    [
        "I'm still here.",
        "You can't ignore me forever.",
        "Did you think I was gone?",
        "Keep playing. I'm watching.",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

/// What a single wake decided to do.
#[derive(Debug, Clone, PartialEq)]
pub enum WakePlan {
    /// Nothing this time.
    Quiet,
    /// Request a generated line; the result arrives later as a command.
    Generate(GenerationRequest),
    /// One action.
    Single(ActionCommand),
    /// Several actions, spaced out.
    Burst(Vec<ActionCommand>),
}

fn pick<'a, T>(items: &'a [T], rng: &mut dyn DeterministicRng) -> Option<&'a T> {
    let last = u32::try_from(items.len().checked_sub(1)?).ok()?;
    let index = rng.next_u32_range(0, last) as usize;
    items.get(index)
}

/// Decides one wake.
///
/// Draw order: the mood's trigger draw; then the generation chance; then
/// (when not generating) the burst chance, the burst size, and one pick per
/// action.
pub fn plan_wake(
    config: &HeartbeatConfig,
    mood: &SharedMood,
    pool: &[AutonomousAction],
    fallbacks: &[String],
    rng: &mut dyn DeterministicRng,
) -> WakePlan {
    if !mood.should_trigger(rng) {
        return WakePlan::Quiet;
    }

    if rng.chance(config.generation_probability) {
        let anger = mood.anger();
        let fallback = pick(fallbacks, rng)
            .cloned()
            .unwrap_or_else(|| "...".to_owned());
        let request = GenerationRequest::new(
            format!("Say one short, unsettling line to the player. Current anger: {anger}/100."),
            fallback,
        )
        .with_param("source", "heartbeat");
        return WakePlan::Generate(request);
    }

    if rng.chance(config.burst_probability) {
        let count = rng.next_u32_range(config.burst_min, config.burst_max);
        let burst: Vec<ActionCommand> = (0..count)
            .filter_map(|_| pick(pool, rng).map(AutonomousAction::to_command))
            .collect();
        return if burst.is_empty() {
            WakePlan::Quiet
        } else {
            WakePlan::Burst(burst)
        };
    }

    pick(pool, rng).map_or(WakePlan::Quiet, |action| WakePlan::Single(action.to_command()))
}
