//! The act state machine.
//!
//! Each act runs as a set of phase tasks: a timeline driver, a generation
//! driver and a duration timer. When the act finishes (timer or an explicit
//! [`NarrativeStateMachine::phase_finished`]), the phase tasks are aborted and
//! two tasks race to complete the transition: the sequence driver and the
//! watchdog. Both carry the transition id they were spawned for, and only
//! the first to present a matching id advances the act.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use wraith_core::clock::Clock;
use wraith_core::event::EventBus;
use wraith_core::generation::{Generator, deliver};
use wraith_core::progress::{ProgressRecord, ProgressStore};
use wraith_core::sink::CommandSink;
use wraith_mood::SharedMood;

use crate::act::{Act, NarrativeState};
use crate::config::NarrativeConfig;
use crate::ending::Ending;
use crate::error::NarrativeError;
use crate::events::NarrativeEvent;
use crate::script::NarrativeScript;
use crate::transition::TransitionSequence;

/// Collaborators the state machine needs.
pub struct NarrativeDeps {
    /// Time source for watchdog deadlines and save timestamps.
    pub clock: Arc<dyn Clock>,
    /// Where timeline and transition commands go.
    pub sink: Arc<dyn CommandSink>,
    /// Persists the act on every change.
    pub store: Arc<dyn ProgressStore>,
    /// Text generator for generation cues.
    pub generator: Option<Arc<dyn Generator>>,
    /// Lifecycle events are published here.
    pub bus: EventBus<NarrativeEvent>,
    /// Read when the story ends.
    pub mood: SharedMood,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Completer {
    Driver,
    Watchdog,
}

struct Machine {
    state: NarrativeState,
    runtime: Option<Handle>,
    shut_down: bool,
    transition_id: u64,
    phase_tasks: Vec<JoinHandle<()>>,
    driver: Option<JoinHandle<()>>,
    watchdog: Option<JoinHandle<()>>,
}

impl Machine {
    fn abort_phase(&mut self) {
        for task in self.phase_tasks.drain(..) {
            task.abort();
        }
    }

    fn abort_all(&mut self) {
        self.abort_phase();
        if let Some(task) = self.driver.take() {
            task.abort();
        }
        if let Some(task) = self.watchdog.take() {
            task.abort();
        }
    }
}

struct Inner {
    config: NarrativeConfig,
    script: NarrativeScript,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn CommandSink>,
    store: Arc<dyn ProgressStore>,
    generator: Option<Arc<dyn Generator>>,
    bus: EventBus<NarrativeEvent>,
    mood: SharedMood,
    machine: Mutex<Machine>,
    saves: tokio::sync::Mutex<()>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: &NarrativeEvent) {
        debug!(event = event.name(), "publishing narrative event");
        self.bus.publish(event);
    }

    fn start_phase(self: &Arc<Self>, machine: &mut Machine, act: Act, runtime: &Handle) -> bool {
        let Some(phase) = self.script.phase(act) else {
            return false;
        };
        info!(act = act.number(), duration_ms = phase.duration_ms, "phase started");
        let started = Instant::now();

        let inner = Arc::clone(self);
        let timeline = phase.timeline.clone();
        machine.phase_tasks.push(runtime.spawn(async move {
            for entry in timeline {
                tokio::time::sleep_until(started + entry.offset()).await;
                debug!(act = act.number(), tag = %entry.tag, "timeline entry due");
                inner.sink.submit(entry.to_command(act));
            }
        }));

        if !phase.generations.is_empty() {
            let inner = Arc::clone(self);
            let cues = phase.generations.clone();
            machine.phase_tasks.push(runtime.spawn(async move {
                let mut in_flight = JoinSet::new();
                for cue in cues {
                    tokio::time::sleep_until(started + cue.offset()).await;
                    let request = cue.to_request(act);
                    if let Some(generator) = inner.generator.clone() {
                        let sink = Arc::clone(&inner.sink);
                        in_flight.spawn(async move {
                            deliver(generator.as_ref(), request, sink.as_ref()).await;
                        });
                    } else {
                        let fallback = request.fallback.clone();
                        inner.sink.submit(request.into_command(fallback));
                    }
                }
                while in_flight.join_next().await.is_some() {}
            }));
        }

        let inner = Arc::clone(self);
        let deadline = started + phase.duration();
        machine.phase_tasks.push(runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            debug!(act = act.number(), "phase duration elapsed");
            inner.finish_phase();
        }));
        true
    }

    fn finish_phase(self: &Arc<Self>) -> bool {
        let (from, to) = {
            let mut machine = self.lock();
            let Some(runtime) = machine.runtime.clone() else {
                debug!("phase finished before start; ignoring");
                return false;
            };
            if machine.shut_down || machine.state.act.is_ended() {
                return false;
            }
            if machine.state.transitioning {
                debug!(act = machine.state.act.number(), "transition already in progress; ignoring");
                return false;
            }
            self.begin_transition(&mut machine, &runtime)
        };

        self.publish(&NarrativeEvent::TransitionStarted { from, to });
        true
    }

    fn begin_transition(self: &Arc<Self>, machine: &mut Machine, runtime: &Handle) -> (Act, Act) {
        let from = machine.state.act;
        let to = from.next();
        machine.transition_id += 1;
        let id = machine.transition_id;
        let timeout = self.config.watchdog_timeout;

        machine.abort_phase();
        machine.state.transitioning = true;
        machine.state.watchdog_deadline = Some(
            chrono::Duration::from_std(timeout)
                .ok()
                .and_then(|delta| self.clock.now().checked_add_signed(delta))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );
        info!(from = from.number(), to = to.number(), transition = id, "transition started");

        let inner = Arc::clone(self);
        let sequence = TransitionSequence::standard(from, to, &self.config);
        machine.driver = Some(runtime.spawn(async move {
            sequence.run(inner.sink.as_ref()).await;
            inner.complete(id, Completer::Driver).await;
        }));

        let inner = Arc::clone(self);
        machine.watchdog = Some(runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            inner.complete(id, Completer::Watchdog).await;
        }));

        (from, to)
    }

    async fn complete(self: Arc<Self>, id: u64, by: Completer) {
        // Advancing the act and starting its phase happen under one lock, so
        // no signal can observe an advanced act without a running phase.
        let (from, to, started) = {
            let mut machine = self.lock();
            if machine.shut_down || !machine.state.transitioning || machine.transition_id != id {
                debug!(transition = id, ?by, "transition already completed");
                return;
            }

            // The completer's own handle is dropped, never aborted.
            let (own, other) = match by {
                Completer::Driver => (machine.driver.take(), machine.watchdog.take()),
                Completer::Watchdog => (machine.watchdog.take(), machine.driver.take()),
            };
            drop(own);
            if let Some(task) = other {
                task.abort();
            }

            let from = machine.state.act;
            let to = from.next();
            machine.state = NarrativeState::at(to);
            let started = match machine.runtime.clone() {
                Some(runtime) if !to.is_ended() => self.start_phase(&mut machine, to, &runtime),
                _ => false,
            };
            (from, to, started)
        };

        if by == Completer::Watchdog {
            warn!(from = from.number(), to = to.number(), transition = id, "transition stalled; watchdog completed it");
            self.publish(&NarrativeEvent::WatchdogFired { from, to });
        }
        info!(from = from.number(), to = to.number(), "act advanced");
        self.publish(&NarrativeEvent::PhaseAdvanced { from, to });
        if started {
            self.publish(&NarrativeEvent::PhaseStarted { act: to });
        }

        self.persist(to).await;

        if to.is_ended() {
            let ending = Ending::from_mood(&self.mood.snapshot());
            info!(%ending, "story ended");
            self.publish(&NarrativeEvent::Ended { ending });
        }
    }

    /// Saves `act`, bounded by the save timeout. Saves run one at a time in
    /// the order acts advanced.
    async fn persist(&self, act: Act) {
        let record = ProgressRecord {
            act: act.number(),
            saved_at: self.clock.now(),
        };
        let _turn = self.saves.lock().await;
        let timeout = self.config.save_timeout;
        match tokio::time::timeout(timeout, self.store.save(&record)).await {
            Ok(Ok(())) => debug!(act = act.number(), "progress persisted"),
            Ok(Err(e)) => error!(act = act.number(), error = %e, "failed to persist progress"),
            Err(_) => error!(act = act.number(), ?timeout, "progress save timed out"),
        }
    }
}

/// Four-act story driver.
///
/// Cloning yields another handle to the same machine, so completion
/// signals can come from handlers running anywhere.
#[derive(Clone)]
pub struct NarrativeStateMachine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for NarrativeStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeStateMachine")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Non-owning handle to a [`NarrativeStateMachine`]. Lets collaborators the
/// machine itself owns, such as handlers behind its command sink, reach it
/// without keeping it alive.
#[derive(Debug, Clone, Default)]
pub struct WeakNarrative {
    inner: Weak<Inner>,
}

impl WeakNarrative {
    /// The machine, if any strong handle to it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<NarrativeStateMachine> {
        self.inner.upgrade().map(|inner| NarrativeStateMachine { inner })
    }
}

impl NarrativeStateMachine {
    /// A handle that does not keep the machine alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakNarrative {
        WeakNarrative {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Creates a machine at act 1. Nothing runs until [`start`](Self::start).
    #[must_use]
    pub fn new(config: NarrativeConfig, script: NarrativeScript, deps: NarrativeDeps) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                script,
                clock: deps.clock,
                sink: deps.sink,
                store: deps.store,
                generator: deps.generator,
                bus: deps.bus,
                mood: deps.mood,
                machine: Mutex::new(Machine {
                    state: NarrativeState::at(Act::One),
                    runtime: None,
                    shut_down: false,
                    transition_id: 0,
                    phase_tasks: Vec::new(),
                    driver: None,
                    watchdog: None,
                }),
                saves: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Loads the saved act from the progress store.
    ///
    /// A missing record, a failed load, or an out-of-range act (including a
    /// finished story) starts at act 1. Has no effect once started.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Act {
        let act = match self.inner.store.load().await {
            Ok(Some(record)) => match Act::from_number(record.act) {
                Some(act) if !act.is_ended() => act,
                _ => {
                    warn!(act = record.act, "saved act is not resumable; starting at act 1");
                    Act::One
                }
            },
            Ok(None) => Act::One,
            Err(e) => {
                error!(error = %e, "failed to load progress; starting at act 1");
                Act::One
            }
        };

        let mut machine = self.inner.lock();
        if machine.runtime.is_some() || machine.shut_down {
            warn!("restore after start ignored");
            return machine.state.act;
        }
        machine.state = NarrativeState::at(act);
        info!(act = act.number(), "progress restored");
        act
    }

    /// Starts the current act's phase on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `NarrativeError::AlreadyStarted` on a second call,
    /// `NarrativeError::ShutDown` after [`shutdown`](Self::shutdown), and
    /// `NarrativeError::Runtime` outside a tokio runtime.
    pub fn start(&self) -> Result<(), NarrativeError> {
        let act = {
            let mut machine = self.inner.lock();
            if machine.shut_down {
                return Err(NarrativeError::ShutDown);
            }
            if machine.runtime.is_some() {
                return Err(NarrativeError::AlreadyStarted);
            }
            let runtime =
                Handle::try_current().map_err(|e| NarrativeError::Runtime(e.to_string()))?;
            let act = machine.state.act;
            let _ = self.inner.start_phase(&mut machine, act, &runtime);
            machine.runtime = Some(runtime);
            act
        };

        self.inner.publish(&NarrativeEvent::PhaseStarted { act });
        Ok(())
    }

    /// Signals that the current act is finished. Returns `true` if this
    /// signal began a transition; signals during a transition, before
    /// start, after shutdown, or once ended return `false`.
    pub fn phase_finished(&self) -> bool {
        self.inner.finish_phase()
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> NarrativeState {
        self.inner.lock().state.clone()
    }

    /// Aborts every phase, transition and watchdog task. Later signals are
    /// ignored and the machine cannot be restarted.
    pub fn shutdown(&self) {
        let mut machine = self.inner.lock();
        if machine.shut_down {
            return;
        }
        machine.shut_down = true;
        machine.runtime = None;
        machine.abort_all();
        info!(act = machine.state.act.number(), "narrative shut down");
    }
}
