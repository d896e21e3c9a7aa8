//! Wraith — narrative state machine.
//!
//! Drives the four acts of the story. Each act plays a scripted timeline of
//! commands, then hands over through a transition sequence guarded by a
//! watchdog so a lost completion signal can never wedge the story.

pub mod act;
pub mod config;
pub mod ending;
pub mod error;
pub mod events;
pub mod machine;
pub mod script;
pub mod transition;

pub use act::{Act, NarrativeState};
pub use config::NarrativeConfig;
pub use ending::Ending;
pub use error::{NarrativeError, ScriptError};
pub use events::NarrativeEvent;
pub use machine::{NarrativeDeps, NarrativeStateMachine, WeakNarrative};
pub use script::{GenerationCue, NarrativeScript, PhaseScript, TimelineEntry};
pub use transition::{TransitionSequence, TransitionStep};
