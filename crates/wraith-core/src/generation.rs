//! Asynchronous text generation contract.
//!
//! Generation is fire-and-forget from the requester's point of view: the
//! requester spawns [`deliver`] and moves on, and the result comes back as an
//! ordinary command through the [`CommandSink`]. A failed generation falls
//! back to the request's pre-scripted line so nothing user-visible breaks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{ActionCommand, Params};
use crate::error::CoreError;
use crate::sink::CommandSink;

/// Tag used for delivered generation results unless a request overrides it.
pub const GENERATED_LINE_TAG: &str = "generated_line";

/// A request for one generated line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Instruction for the generator.
    pub prompt: String,
    /// Line spoken instead when generation fails.
    pub fallback: String,
    /// Tag of the command that carries the result.
    #[serde(default = "default_result_tag")]
    pub result_tag: String,
    /// Params copied onto the result command.
    #[serde(default)]
    pub params: Params,
}

fn default_result_tag() -> String {
    GENERATED_LINE_TAG.to_owned()
}

impl GenerationRequest {
    /// Creates a request delivering under [`GENERATED_LINE_TAG`].
    #[must_use]
    pub fn new(prompt: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            fallback: fallback.into(),
            result_tag: default_result_tag(),
            params: Params::new(),
        }
    }

    /// Adds a param to the eventual result command.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Builds the result command carrying `line` as speech.
    #[must_use]
    pub fn into_command(self, line: String) -> ActionCommand {
        let mut command = ActionCommand::new(self.result_tag).with_speech(line);
        command.params = self.params;
        command
    }
}

/// Produces text for a request, typically by calling a language model.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generates one line.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, CoreError>;
}

/// Runs `request` through `generator` and submits the outcome to `sink`,
/// substituting the fallback line on failure or an empty result.
pub async fn deliver(generator: &dyn Generator, request: GenerationRequest, sink: &dyn CommandSink) {
    let line = match generator.generate(&request).await {
        Ok(line) if !line.trim().is_empty() => {
            debug!(prompt = %request.prompt, "generation delivered");
            line
        }
        Ok(_) => {
            warn!(prompt = %request.prompt, "generator returned an empty line; using fallback");
            request.fallback.clone()
        }
        Err(err) => {
            warn!(prompt = %request.prompt, error = %err, "generation failed; using fallback");
            request.fallback.clone()
        }
    };
    sink.submit(request.into_command(line));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Fixed(Result<&'static str, &'static str>);

    #[async_trait]
    impl Generator for Fixed {
        async fn generate(&self, _request: &GenerationRequest) -> Result<String, CoreError> {
            self.0
                .map(str::to_owned)
                .map_err(|e| CoreError::Generation(e.to_owned()))
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<ActionCommand>>);

    impl CommandSink for Collect {
        fn submit(&self, command: ActionCommand) {
            self.0.lock().unwrap().push(command);
        }
    }

    #[tokio::test]
    async fn test_deliver_submits_generated_line() {
        // Arrange
        let sink = Collect::default();
        let request = GenerationRequest::new("taunt the player", "I'm still here.")
            .with_param("source", "heartbeat");

        // Act
        deliver(&Fixed(Ok("You look tired.")), request, &sink).await;

        // Assert
        let commands = sink.0.lock().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].tag, GENERATED_LINE_TAG);
        assert_eq!(commands[0].speech.as_deref(), Some("You look tired."));
        assert_eq!(commands[0].param_str("source"), Some("heartbeat"));
    }

    #[tokio::test]
    async fn test_deliver_falls_back_on_error() {
        let sink = Collect::default();

        deliver(
            &Fixed(Err("timeout")),
            GenerationRequest::new("taunt", "I'm still here."),
            &sink,
        )
        .await;

        let commands = sink.0.lock().unwrap();
        assert_eq!(commands[0].speech.as_deref(), Some("I'm still here."));
    }

    #[tokio::test]
    async fn test_deliver_falls_back_on_blank_line() {
        let sink = Collect::default();

        deliver(&Fixed(Ok("   ")), GenerationRequest::new("taunt", "..."), &sink).await;

        assert_eq!(sink.0.lock().unwrap()[0].speech.as_deref(), Some("..."));
    }
}
