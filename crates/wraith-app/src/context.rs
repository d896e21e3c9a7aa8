//! The application context.
//!
//! Built once in `main` and passed by reference. Owns the engine, the
//! heartbeat and the narrative, and wires them together:
//! - every producer submits into the engine;
//! - the heartbeat is paused for the length of each act transition;
//! - the end of the story is surfaced through [`AppContext::ended`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use wraith_core::clock::{Clock, SystemClock};
use wraith_core::event::EventBus;
use wraith_core::generation::Generator;
use wraith_core::progress::ProgressStore;
use wraith_core::rng::{DeterministicRng, SystemRng};
use wraith_core::sink::CommandSink;
use wraith_dispatch::{ActionRegistry, DispatchConfig, DispatchEngine};
use wraith_heartbeat::{Heartbeat, HeartbeatConfig, HeartbeatDeps};
use wraith_mood::{MoodEvent, SharedMood};
use wraith_narrative::{
    Act, Ending, NarrativeConfig, NarrativeDeps, NarrativeEvent, NarrativeScript,
    NarrativeStateMachine,
};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::generator::OfflineGenerator;
use crate::handlers::{NarrativeLink, standard_handlers};
use crate::input::PlayerInput;
use crate::progress::JsonFileProgressStore;
use crate::ui::UiSender;

/// Collaborators and settings the context is built from.
pub struct AppDeps {
    /// Shared time source.
    pub clock: Arc<dyn Clock>,
    /// Randomness for the heartbeat.
    pub heartbeat_rng: Box<dyn DeterministicRng>,
    /// Where narrative progress is saved.
    pub store: Arc<dyn ProgressStore>,
    /// Line generator; `None` speaks fallbacks only.
    pub generator: Option<Arc<dyn Generator>>,
    /// Timelines for the four acts.
    pub script: NarrativeScript,
    /// Starting mood.
    pub mood: SharedMood,
    /// Heartbeat cadence.
    pub heartbeat: HeartbeatConfig,
    /// Transition timing.
    pub narrative: NarrativeConfig,
}

impl AppDeps {
    /// Production collaborators for `config`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the configured script cannot be read and
    /// `AppError::Script` if it does not validate.
    pub async fn production(config: &AppConfig) -> Result<Self, AppError> {
        let script = match &config.script_path {
            Some(path) => {
                let source = tokio::fs::read_to_string(path).await?;
                info!(path = %path.display(), "loaded timeline script");
                NarrativeScript::from_yaml(&source)?
            }
            None => NarrativeScript::default(),
        };
        let mood = SharedMood::default();

        Ok(Self {
            clock: Arc::new(SystemClock),
            heartbeat_rng: Box::new(SystemRng::new()),
            store: Arc::new(JsonFileProgressStore::new(&config.save_path)),
            generator: Some(Arc::new(OfflineGenerator::new(
                mood.clone(),
                Box::new(SystemRng::new()),
            ))),
            script,
            mood,
            heartbeat: HeartbeatConfig::default(),
            narrative: NarrativeConfig::default(),
        })
    }
}

/// Everything the running application owns.
pub struct AppContext {
    mood: SharedMood,
    bus: EventBus<NarrativeEvent>,
    engine: Arc<DispatchEngine>,
    heartbeat: Arc<Heartbeat>,
    narrative: NarrativeStateMachine,
    ended: watch::Receiver<Option<Ending>>,
    join_timeout: Duration,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("engine", &self.engine)
            .field("heartbeat", &self.heartbeat)
            .field("narrative", &self.narrative)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Wires every component. The engine's workers start immediately; the
    /// heartbeat and the narrative wait for [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Engine` if the engine cannot start.
    pub fn build(dispatch: &DispatchConfig, deps: AppDeps, ui: &UiSender) -> Result<Self, AppError> {
        let link = NarrativeLink::default();
        let handlers = standard_handlers(ui, &deps.mood, &link);
        let engine = Arc::new(DispatchEngine::start(
            dispatch,
            ActionRegistry::standard(),
            handlers,
        )?);
        let sink: Arc<dyn CommandSink> = Arc::clone(&engine) as Arc<dyn CommandSink>;

        let heartbeat = Arc::new(Heartbeat::new(
            deps.heartbeat,
            HeartbeatDeps {
                clock: Arc::clone(&deps.clock),
                rng: deps.heartbeat_rng,
                mood: deps.mood.clone(),
                sink: Arc::clone(&sink),
                generator: deps.generator.clone(),
            },
        ));

        let bus = EventBus::new();
        let narrative = NarrativeStateMachine::new(
            deps.narrative,
            deps.script,
            NarrativeDeps {
                clock: deps.clock,
                sink,
                store: deps.store,
                generator: deps.generator,
                bus: bus.clone(),
                mood: deps.mood.clone(),
            },
        );
        if link.set(narrative.downgrade()).is_err() {
            warn!("narrative link was already bound");
        }

        let paused = Arc::clone(&heartbeat);
        bus.subscribe(move |event: &NarrativeEvent| match event {
            NarrativeEvent::TransitionStarted { .. } => paused.pause(),
            NarrativeEvent::PhaseStarted { .. } => paused.resume(),
            _ => {}
        });

        let (ended_tx, ended) = watch::channel(None);
        bus.subscribe(move |event: &NarrativeEvent| {
            if let NarrativeEvent::Ended { ending } = event {
                ended_tx.send_replace(Some(*ending));
            }
        });

        Ok(Self {
            mood: deps.mood,
            bus,
            engine,
            heartbeat,
            narrative,
            ended,
            join_timeout: dispatch.join_timeout,
        })
    }

    /// Restores progress, then starts the heartbeat and the current act.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Heartbeat` or `AppError::Narrative` if either
    /// cannot start.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<Act, AppError> {
        let act = self.narrative.restore().await;
        self.heartbeat.start()?;
        self.narrative.start()?;
        info!(act = act.number(), "wraith started");
        Ok(act)
    }

    /// Applies one player input. Returns `false` when the player quits.
    pub fn handle_input(&self, input: PlayerInput) -> bool {
        self.heartbeat.update_activity();
        match input {
            PlayerInput::Mood(event) => {
                let anger = self.mood.record(event);
                info!(%event, anger, "player mood event");
            }
            PlayerInput::Command(value) => {
                self.engine.submit_json(&value);
            }
            PlayerInput::Quit => {
                let anger = self.mood.record(MoodEvent::TriedToQuit);
                info!(anger, "player quit");
                return false;
            }
            PlayerInput::Activity => {}
            PlayerInput::Invalid(reason) => warn!(%reason, "ignoring malformed input"),
        }
        true
    }

    /// Receiver that holds `Some(ending)` once the story is over.
    #[must_use]
    pub fn ended(&self) -> watch::Receiver<Option<Ending>> {
        self.ended.clone()
    }

    /// Stops the narrative, then the heartbeat, then drains the engine.
    /// A heartbeat that will not stop is logged and does not block the
    /// engine shutdown.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Engine` if workers outlive the join timeout.
    #[instrument(skip(self))]
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.narrative.shutdown();
        if let Err(e) = self.heartbeat.stop().await {
            error!(error = %e, "heartbeat did not stop cleanly");
        }
        self.engine.shutdown_and_join(self.join_timeout).await?;
        info!("wraith stopped");
        Ok(())
    }

    /// The dispatch engine.
    #[must_use]
    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    /// The heartbeat.
    #[must_use]
    pub fn heartbeat(&self) -> &Heartbeat {
        &self.heartbeat
    }

    /// The narrative.
    #[must_use]
    pub const fn narrative(&self) -> &NarrativeStateMachine {
        &self.narrative
    }

    /// The shared mood.
    #[must_use]
    pub const fn mood(&self) -> &SharedMood {
        &self.mood
    }

    /// The narrative event bus.
    #[must_use]
    pub const fn bus(&self) -> &EventBus<NarrativeEvent> {
        &self.bus
    }
}
