//! Production handlers: forward effects to the UI channel.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use wraith_core::command::ActionCommand;
use wraith_dispatch::{ActionHandler, HandlerCategory, HandlerError, HandlerSet, SpeechRenderer};
use wraith_mood::{MoodEvent, SharedMood};
use wraith_narrative::WeakNarrative;

use crate::ui::{UiRequest, UiSender};

/// Late-bound narrative handle. The narrative is built after the engine,
/// since it submits into it. Weak, because the narrative owns the engine
/// through its command sink.
pub type NarrativeLink = Arc<OnceLock<WeakNarrative>>;

fn forward(ui: &UiSender, request: UiRequest) -> Result<(), HandlerError> {
    if ui.send(request) {
        Ok(())
    } else {
        Err(HandlerError::Unavailable("ui loop has stopped".to_owned()))
    }
}

/// Forwards visual, hardware and system effects to the UI.
#[derive(Debug, Clone)]
pub struct EffectHandler {
    category: HandlerCategory,
    ui: UiSender,
}

impl EffectHandler {
    /// Handler for `category`.
    #[must_use]
    pub const fn new(category: HandlerCategory, ui: UiSender) -> Self {
        Self { category, ui }
    }
}

#[async_trait]
impl ActionHandler for EffectHandler {
    async fn handle(&self, command: &ActionCommand) -> Result<(), HandlerError> {
        debug!(tag = %command.tag, category = ?self.category, "forwarding effect");
        forward(&self.ui, UiRequest::effect(self.category, command))
    }
}

/// Story actions. Ritual results feed the mood and may finish the act;
/// everything else goes to the UI.
#[derive(Debug, Clone)]
pub struct NarrativeHandler {
    ui: UiSender,
    mood: SharedMood,
    narrative: NarrativeLink,
}

impl NarrativeHandler {
    /// Creates the handler.
    #[must_use]
    pub const fn new(ui: UiSender, mood: SharedMood, narrative: NarrativeLink) -> Self {
        Self {
            ui,
            mood,
            narrative,
        }
    }

    fn ritual_result(&self, command: &ActionCommand) -> Result<(), HandlerError> {
        let success = command
            .params
            .get("success")
            .and_then(Value::as_bool)
            .ok_or_else(|| HandlerError::InvalidParams {
                tag: command.tag.clone(),
                reason: "missing boolean 'success'".to_owned(),
            })?;

        if success {
            let anger = self.mood.record(MoodEvent::RitualSucceeded);
            let advanced = self
                .narrative
                .get()
                .and_then(WeakNarrative::upgrade)
                .is_some_and(|narrative| narrative.phase_finished());
            info!(anger, advanced, "ritual succeeded");
        } else {
            let anger = self.mood.record(MoodEvent::RitualFailed);
            info!(anger, "ritual failed");
        }
        Ok(())
    }
}

#[async_trait]
impl ActionHandler for NarrativeHandler {
    async fn handle(&self, command: &ActionCommand) -> Result<(), HandlerError> {
        if command.tag == "ritual_result" {
            return self.ritual_result(command);
        }
        forward(
            &self.ui,
            UiRequest::effect(HandlerCategory::Narrative, command),
        )
    }
}

/// Sends speech lines to the UI.
#[derive(Debug, Clone)]
pub struct UiSpeech {
    ui: UiSender,
}

impl UiSpeech {
    /// Creates the renderer.
    #[must_use]
    pub const fn new(ui: UiSender) -> Self {
        Self { ui }
    }
}

#[async_trait]
impl SpeechRenderer for UiSpeech {
    async fn speak(&self, text: &str) -> Result<(), HandlerError> {
        forward(&self.ui, UiRequest::Speech(text.to_owned()))
    }
}

/// The full production handler set.
#[must_use]
pub fn standard_handlers(ui: &UiSender, mood: &SharedMood, narrative: &NarrativeLink) -> HandlerSet {
    HandlerSet::new()
        .with_handler(
            HandlerCategory::Visual,
            Arc::new(EffectHandler::new(HandlerCategory::Visual, ui.clone())),
        )
        .with_handler(
            HandlerCategory::Hardware,
            Arc::new(EffectHandler::new(HandlerCategory::Hardware, ui.clone())),
        )
        .with_handler(
            HandlerCategory::System,
            Arc::new(EffectHandler::new(HandlerCategory::System, ui.clone())),
        )
        .with_handler(
            HandlerCategory::Narrative,
            Arc::new(NarrativeHandler::new(
                ui.clone(),
                mood.clone(),
                Arc::clone(narrative),
            )),
        )
        .with_speech(Arc::new(UiSpeech::new(ui.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{self, CollectingPresenter};

    #[tokio::test]
    async fn test_effect_handler_forwards_command() {
        // Arrange
        let (tx, mut rx) = ui::channel();
        let handler = EffectHandler::new(HandlerCategory::Hardware, tx);
        let command = ActionCommand::new("mouse_drift").with_param("pixels", 40);

        // Act
        handler.handle(&command).await.unwrap();

        // Assert
        let mut presenter = CollectingPresenter::default();
        rx.drain(&mut presenter);
        assert_eq!(
            presenter.requests,
            vec![UiRequest::effect(HandlerCategory::Hardware, &command)]
        );
    }

    #[tokio::test]
    async fn test_closed_ui_is_unavailable() {
        let (tx, rx) = ui::channel();
        drop(rx);
        let handler = EffectHandler::new(HandlerCategory::Visual, tx);

        let result = handler.handle(&ActionCommand::new("glitch")).await;

        assert!(matches!(result, Err(HandlerError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_ritual_result_records_mood() {
        let (tx, _rx) = ui::channel();
        let mood = SharedMood::default();
        mood.record(MoodEvent::Insult);
        let handler = NarrativeHandler::new(tx, mood.clone(), NarrativeLink::default());

        handler
            .handle(&ActionCommand::new("ritual_result").with_param("success", true))
            .await
            .unwrap();
        handler
            .handle(&ActionCommand::new("ritual_result").with_param("success", false))
            .await
            .unwrap();

        let snapshot = mood.snapshot();
        assert_eq!(snapshot.anger.value(), 12);
        assert_eq!(snapshot.counters.compliance, 1);
        assert_eq!(snapshot.counters.defiance, 1);
    }

    #[tokio::test]
    async fn test_ritual_result_without_success_flag_is_invalid() {
        let (tx, _rx) = ui::channel();
        let handler = NarrativeHandler::new(tx, SharedMood::default(), NarrativeLink::default());

        let result = handler
            .handle(&ActionCommand::new("ritual_result").with_param("success", "yes"))
            .await;

        assert!(matches!(result, Err(HandlerError::InvalidParams { .. })));
    }

    #[tokio::test]
    async fn test_speech_goes_to_ui() {
        let (tx, mut rx) = ui::channel();

        UiSpeech::new(tx).speak("I see you.").await.unwrap();

        assert_eq!(rx.recv().await, Some(UiRequest::Speech("I see you.".into())));
    }
}
