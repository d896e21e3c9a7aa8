//! Static tag → handler-category table.
//!
//! The dispatcher never interprets tags itself: it resolves them here, and
//! the category decides both which handler runs and which [`Tier`] the
//! command queues under. Adding an action means adding an entry, nothing
//! more.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use wraith_core::command::Tier;

/// The handler family an action belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerCategory {
    /// Screen and window perturbations.
    Visual,
    /// Mouse, keyboard, audio-level and display hardware.
    Hardware,
    /// Files, wallpaper, windows and cleanup.
    System,
    /// Story-specific actions: speech lines, ritual prompts.
    Narrative,
}

impl HandlerCategory {
    /// Queue tier for actions in this category.
    ///
    /// Visual and hardware effects must land the moment they are issued, so
    /// they queue `High`; everything else queues `Low`.
    #[must_use]
    pub const fn tier(self) -> Tier {
        match self {
            Self::Visual | Self::Hardware => Tier::High,
            Self::System | Self::Narrative => Tier::Low,
        }
    }
}

const STANDARD_ACTIONS: &[(&str, HandlerCategory)] = &[
    ("glitch", HandlerCategory::Visual),
    ("screen_shake", HandlerCategory::Visual),
    ("screen_flicker", HandlerCategory::Visual),
    ("invert_colors", HandlerCategory::Visual),
    ("static_overlay", HandlerCategory::Visual),
    ("window_shake", HandlerCategory::Visual),
    ("fake_error_dialog", HandlerCategory::Visual),
    ("subliminal_text", HandlerCategory::Visual),
    ("terminal_line", HandlerCategory::Visual),
    ("title_card", HandlerCategory::Visual),
    ("mouse_drift", HandlerCategory::Hardware),
    ("mouse_freeze", HandlerCategory::Hardware),
    ("keyboard_leds", HandlerCategory::Hardware),
    ("volume_spike", HandlerCategory::Hardware),
    ("brightness_dip", HandlerCategory::Hardware),
    ("open_notepad", HandlerCategory::System),
    ("create_desktop_file", HandlerCategory::System),
    ("cleanup_files", HandlerCategory::System),
    ("change_wallpaper", HandlerCategory::System),
    ("restore_wallpaper", HandlerCategory::System),
    ("minimize_windows", HandlerCategory::System),
    ("open_browser", HandlerCategory::System),
    ("speak", HandlerCategory::Narrative),
    ("whisper", HandlerCategory::Narrative),
    ("generated_line", HandlerCategory::Narrative),
    ("ritual_prompt", HandlerCategory::Narrative),
    ("ritual_result", HandlerCategory::Narrative),
];

/// Lookup table from action tag to handler category.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    entries: HashMap<String, HandlerCategory>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActionRegistry {
    /// A registry with no actions.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The built-in action table.
    #[must_use]
    pub fn standard() -> Self {
        let entries = STANDARD_ACTIONS
            .iter()
            .map(|(tag, category)| ((*tag).to_owned(), *category))
            .collect();
        Self { entries }
    }

    /// Adds or replaces an entry, returning the previous category.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        category: HandlerCategory,
    ) -> Option<HandlerCategory> {
        self.entries.insert(tag.into(), category)
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, tag: impl Into<String>, category: HandlerCategory) -> Self {
        self.register(tag, category);
        self
    }

    /// Category for `tag`, or `None` for unknown tags.
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<HandlerCategory> {
        self.entries.get(tag).copied()
    }

    /// Tier for `tag`, or `None` for unknown tags.
    #[must_use]
    pub fn tier_of(&self, tag: &str) -> Option<Tier> {
        self.resolve(tag).map(HandlerCategory::tier)
    }

    /// Whether `tag` is registered.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Registered tags in `category`, sorted.
    #[must_use]
    pub fn tags_in(&self, category: HandlerCategory) -> Vec<&str> {
        let mut tags: Vec<&str> = self
            .entries
            .iter()
            .filter(|(_, c)| **c == category)
            .map(|(tag, _)| tag.as_str())
            .collect();
        tags.sort_unstable();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visual_and_hardware_actions_queue_high() {
        let registry = ActionRegistry::standard();

        assert_eq!(registry.tier_of("glitch"), Some(Tier::High));
        assert_eq!(registry.tier_of("title_card"), Some(Tier::High));
        assert_eq!(registry.tier_of("mouse_drift"), Some(Tier::High));
    }

    #[test]
    fn test_system_and_narrative_actions_queue_low() {
        let registry = ActionRegistry::standard();

        assert_eq!(registry.tier_of("cleanup_files"), Some(Tier::Low));
        assert_eq!(registry.tier_of("create_desktop_file"), Some(Tier::Low));
        assert_eq!(registry.tier_of("speak"), Some(Tier::Low));
    }

    #[test]
    fn test_unknown_tag_resolves_to_none() {
        let registry = ActionRegistry::standard();

        assert_eq!(registry.resolve("summon_cat"), None);
        assert!(!registry.contains("summon_cat"));
    }

    #[test]
    fn test_register_adds_new_action_without_other_changes() {
        let registry = ActionRegistry::empty().with("summon_cat", HandlerCategory::Visual);

        assert_eq!(registry.resolve("summon_cat"), Some(HandlerCategory::Visual));
        assert_eq!(registry.tags_in(HandlerCategory::Visual), vec!["summon_cat"]);
    }

    #[test]
    fn test_register_returns_previous_category() {
        let mut registry = ActionRegistry::standard();

        let previous = registry.register("speak", HandlerCategory::System);

        assert_eq!(previous, Some(HandlerCategory::Narrative));
        assert_eq!(registry.tier_of("speak"), Some(Tier::Low));
    }

    #[test]
    fn test_standard_table_has_no_duplicate_tags() {
        let registry = ActionRegistry::standard();
        assert_eq!(registry.entries.len(), STANDARD_ACTIONS.len());
    }
}
