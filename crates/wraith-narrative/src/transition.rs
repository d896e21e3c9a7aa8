//! Inter-act transition sequences.

use std::time::Duration;

use wraith_core::command::ActionCommand;
use wraith_core::sink::CommandSink;

use crate::act::Act;
use crate::config::NarrativeConfig;

/// Wait `delay`, then emit `commands`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionStep {
    /// Delay after the previous step.
    pub delay: Duration,
    /// Commands emitted once the delay elapses.
    pub commands: Vec<ActionCommand>,
}

/// Ordered steps run by one driver task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransitionSequence {
    steps: Vec<TransitionStep>,
}

impl TransitionSequence {
    /// A sequence of explicit steps.
    #[must_use]
    pub const fn new(steps: Vec<TransitionStep>) -> Self {
        Self { steps }
    }

    /// Terminal status lines, then a title card, then a hold.
    #[must_use]
    pub fn standard(from: Act, to: Act, config: &NarrativeConfig) -> Self {
        let terminal = |text: String| {
            ActionCommand::new("terminal_line")
                .with_param("text", text)
                .with_param("source", "transition")
        };
        let title = match to {
            Act::Ended => "THE END".to_owned(),
            act => format!("ACT {}", roman(act.number())),
        };

        Self::new(vec![
            TransitionStep {
                delay: Duration::ZERO,
                commands: vec![
                    terminal(format!("> {from} complete")),
                    terminal(format!("> loading {to}...")),
                ],
            },
            TransitionStep {
                delay: config.title_card_delay,
                commands: vec![
                    ActionCommand::new("title_card")
                        .with_param("text", title)
                        .with_param("source", "transition"),
                ],
            },
            TransitionStep {
                delay: config.title_card_hold,
                commands: Vec::new(),
            },
        ])
    }

    /// The steps in order.
    #[must_use]
    pub fn steps(&self) -> &[TransitionStep] {
        &self.steps
    }

    /// Sum of all step delays.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|step| step.delay).sum()
    }

    /// Plays every step into `sink`.
    pub async fn run(&self, sink: &dyn CommandSink) {
        for step in &self.steps {
            if !step.delay.is_zero() {
                tokio::time::sleep(step.delay).await;
            }
            for command in &step.commands {
                sink.submit(command.clone());
            }
        }
    }
}

fn roman(number: u8) -> &'static str {
    match number {
        1 => "I",
        2 => "II",
        3 => "III",
        4 => "IV",
        _ => "",
    }
}
