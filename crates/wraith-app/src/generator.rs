//! Offline line generator.
//!
//! Stands in for a language model: picks a canned line, shaded by the
//! current anger. A real model client would implement the same trait.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use wraith_core::error::CoreError;
use wraith_core::generation::{GenerationRequest, Generator};
use wraith_core::rng::DeterministicRng;
use wraith_mood::SharedMood;

const CALM_LINES: &[&str] = &[
    "It's quiet in here. I like it when you stay.",
    "You came back. I knew you would.",
    "Tell me about your day. I'm listening.",
];

const ANGRY_LINES: &[&str] = &[
    "Stop pretending I'm not here.",
    "Every time you look away, I get closer.",
    "You should not have done that.",
];

/// Generator that draws from fixed line pools.
pub struct OfflineGenerator {
    mood: SharedMood,
    rng: Mutex<Box<dyn DeterministicRng>>,
}

impl std::fmt::Debug for OfflineGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineGenerator").finish_non_exhaustive()
    }
}

impl OfflineGenerator {
    /// Creates the generator.
    #[must_use]
    pub fn new(mood: SharedMood, rng: Box<dyn DeterministicRng>) -> Self {
        Self {
            mood,
            rng: Mutex::new(rng),
        }
    }
}

#[async_trait]
impl Generator for OfflineGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CoreError> {
        if request.prompt.trim().is_empty() {
            return Err(CoreError::Generation("empty prompt".to_owned()));
        }
        let pool = if self.mood.anger() > 50 {
            ANGRY_LINES
        } else {
            CALM_LINES
        };
        let last = u32::try_from(pool.len() - 1).unwrap_or(0);
        let index = self
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_u32_range(0, last) as usize;
        Ok(pool.get(index).copied().unwrap_or(pool[0]).to_owned())
    }
}
