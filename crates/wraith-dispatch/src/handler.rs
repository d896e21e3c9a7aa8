//! Handler contracts and the per-category handler set.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use wraith_core::command::ActionCommand;

use crate::error::HandlerError;
use crate::registry::HandlerCategory;

/// Executes commands of one category. Implementations interpret `params`
/// per their own documented parameter set.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Runs one command.
    async fn handle(&self, command: &ActionCommand) -> Result<(), HandlerError>;
}

/// Renders a command's `speech` line.
#[async_trait]
pub trait SpeechRenderer: Send + Sync {
    /// Speaks `text`.
    async fn speak(&self, text: &str) -> Result<(), HandlerError>;
}

/// The handlers the engine routes to, one per category.
#[derive(Clone, Default)]
pub struct HandlerSet {
    handlers: HashMap<HandlerCategory, Arc<dyn ActionHandler>>,
    speech: Option<Arc<dyn SpeechRenderer>>,
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut categories: Vec<_> = self.handlers.keys().collect();
        categories.sort_by_key(|c| format!("{c:?}"));
        f.debug_struct("HandlerSet")
            .field("categories", &categories)
            .field("speech", &self.speech.is_some())
            .finish()
    }
}

impl HandlerSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler for `category`.
    #[must_use]
    pub fn with_handler(
        mut self,
        category: HandlerCategory,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        self.handlers.insert(category, handler);
        self
    }

    /// Registers the same handler for every category.
    #[must_use]
    pub fn with_fallback(mut self, handler: Arc<dyn ActionHandler>) -> Self {
        for category in [
            HandlerCategory::Visual,
            HandlerCategory::Hardware,
            HandlerCategory::System,
            HandlerCategory::Narrative,
        ] {
            self.handlers
                .entry(category)
                .or_insert_with(|| Arc::clone(&handler));
        }
        self
    }

    /// Registers the speech renderer.
    #[must_use]
    pub fn with_speech(mut self, renderer: Arc<dyn SpeechRenderer>) -> Self {
        self.speech = Some(renderer);
        self
    }

    /// Handler for `category`, if one is registered.
    #[must_use]
    pub fn get(&self, category: HandlerCategory) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&category).cloned()
    }

    /// The speech renderer, if one is registered.
    #[must_use]
    pub fn speech(&self) -> Option<Arc<dyn SpeechRenderer>> {
        self.speech.clone()
    }
}
