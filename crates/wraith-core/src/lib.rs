//! Wraith Core — shared abstractions.
//!
//! This crate defines the command contract, the determinism seams (clock and
//! RNG), the event bus, and the collaborator traits that every other Wraith
//! crate depends on. It contains no runtime wiring.

pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod generation;
pub mod progress;
pub mod rng;
pub mod sink;
