//! Recording command sink.

use std::sync::{Mutex, PoisonError};

use wraith_core::command::ActionCommand;
use wraith_core::sink::CommandSink;

/// A sink that records every submitted command in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<ActionCommand>>,
}

impl RecordingSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all submitted commands.
    pub fn commands(&self) -> Vec<ActionCommand> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the submitted tags in order.
    pub fn tags(&self) -> Vec<String> {
        self.commands().into_iter().map(|c| c.tag).collect()
    }
}

impl CommandSink for RecordingSink {
    fn submit(&self, command: ActionCommand) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }
}
