//! Wraith — application wiring.
//!
//! Builds the [`context::AppContext`] that owns the dispatch engine, the
//! heartbeat and the narrative, plus the production collaborators the
//! `wraith` binary plugs into them.

pub mod config;
pub mod context;
pub mod error;
pub mod generator;
pub mod handlers;
pub mod input;
pub mod progress;
pub mod telemetry;
pub mod ui;
