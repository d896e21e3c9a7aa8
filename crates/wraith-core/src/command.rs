//! The action command contract.
//!
//! Every producer (heartbeat, narrative timelines, sensors, input handlers,
//! generation callbacks) builds an [`ActionCommand`] and hands it to a
//! [`crate::sink::CommandSink`]. The tag is opaque here; resolving it to a
//! handler and a [`Tier`] is the dispatcher's job.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::CoreError;

/// Ordered parameter map carried by a command.
pub type Params = BTreeMap<String, Value>;

/// Priority class of a command. Lower rank is executed sooner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Effects that must feel instantaneous.
    High,
    /// System, cleanup and file-oriented work.
    Low,
}

impl Tier {
    /// Rank used as the primary queue ordering key. Rank 0 is reserved for
    /// shutdown sentinels.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::High => 1,
            Self::Low => 2,
        }
    }
}

/// A single action to be executed by a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCommand {
    /// Action identifier resolved through the handler registry.
    pub tag: String,
    /// Handler-specific parameters.
    #[serde(default)]
    pub params: Params,
    /// Optional line for the speech renderer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speech: Option<String>,
    /// Correlation ID to trace this command through the system.
    #[serde(default = "Uuid::new_v4", skip_serializing)]
    pub correlation_id: Uuid,
}

impl ActionCommand {
    /// Creates a command with no params and no speech.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            params: Params::new(),
            speech: None,
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Attaches a speech line.
    #[must_use]
    pub fn with_speech(mut self, speech: impl Into<String>) -> Self {
        self.speech = Some(speech.into());
        self
    }

    /// Parses the wire schema `{ "action": <tag>, "params": {...}, "speech": <string?> }`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::MalformedCommand` if the value is not an object,
    /// `action` is missing, empty or not a string, `params` is not an
    /// object, or `speech` is neither a string nor null.
    pub fn from_json(value: &Value) -> Result<Self, CoreError> {
        let object = value
            .as_object()
            .ok_or_else(|| CoreError::MalformedCommand("command must be an object".to_owned()))?;

        let tag = match object.get("action") {
            Some(Value::String(tag)) if !tag.trim().is_empty() => tag.clone(),
            Some(Value::String(_)) => {
                return Err(CoreError::MalformedCommand("action is empty".to_owned()));
            }
            Some(_) => {
                return Err(CoreError::MalformedCommand(
                    "action must be a string".to_owned(),
                ));
            }
            None => return Err(CoreError::MalformedCommand("missing action".to_owned())),
        };

        let params = match object.get("params") {
            None | Some(Value::Null) => Params::new(),
            Some(Value::Object(map)) => map.clone().into_iter().collect(),
            Some(_) => {
                return Err(CoreError::MalformedCommand(format!(
                    "params for '{tag}' must be an object"
                )));
            }
        };

        let speech = match object.get("speech") {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(_) => {
                return Err(CoreError::MalformedCommand(format!(
                    "speech for '{tag}' must be a string"
                )));
            }
        };

        Ok(Self {
            tag,
            params,
            speech,
            correlation_id: Uuid::new_v4(),
        })
    }

    /// Renders the command back into its wire schema.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("action".to_owned(), Value::String(self.tag.clone()));
        object.insert(
            "params".to_owned(),
            Value::Object(self.params.clone().into_iter().collect()),
        );
        if let Some(speech) = &self.speech {
            object.insert("speech".to_owned(), Value::String(speech.clone()));
        }
        Value::Object(object)
    }

    /// Returns a string parameter, if present.
    #[must_use]
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}
