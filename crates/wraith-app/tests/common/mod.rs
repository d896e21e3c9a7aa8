//! Shared test helpers for application integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wraith_app::context::{AppContext, AppDeps};
use wraith_app::ui::{self, CollectingPresenter, UiReceiver, UiRequest};
use wraith_core::command::Params;
use wraith_core::progress::ProgressStore;
use wraith_dispatch::DispatchConfig;
use wraith_heartbeat::HeartbeatConfig;
use wraith_mood::SharedMood;
use wraith_narrative::{NarrativeConfig, NarrativeScript, PhaseScript, TimelineEntry};
use wraith_test_support::{InMemoryProgressStore, ManualClock, SequenceRng};

/// A fully wired application with in-memory collaborators.
pub struct TestApp {
    pub context: AppContext,
    pub ui: UiReceiver,
    pub store: Arc<InMemoryProgressStore>,
}

impl TestApp {
    /// Presents everything queued so far and returns it.
    pub fn drain_ui(&mut self) -> Vec<UiRequest> {
        let mut presenter = CollectingPresenter::default();
        self.ui.drain(&mut presenter);
        presenter.requests
    }
}

fn phase(act: u8, duration_ms: u64) -> PhaseScript {
    PhaseScript {
        act,
        duration_ms,
        timeline: Vec::new(),
        generations: Vec::new(),
    }
}

/// Four acts of `duration_ms` each. Act one prints "hello" after a second.
pub fn short_script(duration_ms: u64) -> NarrativeScript {
    let mut params = Params::new();
    params.insert("text".to_owned(), json!("hello"));
    let mut first = phase(1, duration_ms);
    first.timeline.push(TimelineEntry {
        offset_ms: 1_000,
        tag: "terminal_line".to_owned(),
        params,
        speech: None,
    });

    let mut phases = vec![first];
    phases.extend((2..=4).map(|act| phase(act, duration_ms)));
    NarrativeScript::new(phases).unwrap()
}

/// Builds the app around `script`. The heartbeat never triggers: every draw
/// is 0.999, above any trigger probability.
pub fn build_test_app(script: NarrativeScript) -> TestApp {
    build_test_app_with_store(script, Arc::new(InMemoryProgressStore::new()))
}

/// Like [`build_test_app`], resuming from whatever `store` holds.
pub fn build_test_app_with_store(
    script: NarrativeScript,
    store: Arc<InMemoryProgressStore>,
) -> TestApp {
    let saves: Arc<dyn ProgressStore> = store.clone();
    let deps = AppDeps {
        clock: Arc::new(ManualClock::at_epoch()),
        heartbeat_rng: Box::new(SequenceRng::with_floats(vec![0.999])),
        store: saves,
        generator: None,
        script,
        mood: SharedMood::default(),
        heartbeat: HeartbeatConfig::default(),
        narrative: NarrativeConfig::default(),
    };
    let (ui_tx, ui) = ui::channel();
    let mut dispatch = DispatchConfig::with_workers(2);
    dispatch.join_timeout = Duration::from_secs(2);

    let context = AppContext::build(&dispatch, deps, &ui_tx).unwrap();
    TestApp { context, ui, store }
}
