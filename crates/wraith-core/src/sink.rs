//! The single entry point producers use to hand off commands.

use std::sync::Arc;

use crate::command::ActionCommand;

/// Anything that accepts commands for eventual execution.
///
/// Implementations must be non-blocking and callable from any thread;
/// they never report failure to the producer.
pub trait CommandSink: Send + Sync {
    /// Hands a command off for execution.
    fn submit(&self, command: ActionCommand);
}

impl<T: CommandSink + ?Sized> CommandSink for Arc<T> {
    fn submit(&self, command: ActionCommand) {
        (**self).submit(command);
    }
}
