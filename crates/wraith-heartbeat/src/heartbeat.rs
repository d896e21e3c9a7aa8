//! The heartbeat loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use wraith_core::clock::Clock;
use wraith_core::generation::{GenerationRequest, Generator, deliver};
use wraith_core::rng::DeterministicRng;
use wraith_core::sink::CommandSink;
use wraith_mood::SharedMood;

use crate::actions::{AutonomousAction, WakePlan, plan_wake, standard_fallback_lines};
use crate::config::HeartbeatConfig;
use crate::error::HeartbeatError;
use crate::interval::compute_interval;

/// Collaborators the heartbeat needs.
pub struct HeartbeatDeps {
    /// Time source for idle tracking.
    pub clock: Arc<dyn Clock>,
    /// Randomness for cadence and choices.
    pub rng: Box<dyn DeterministicRng>,
    /// Mood the cadence is derived from.
    pub mood: SharedMood,
    /// Where emitted commands go.
    pub sink: Arc<dyn CommandSink>,
    /// Text generator; without one, generation wakes speak a fallback line.
    pub generator: Option<Arc<dyn Generator>>,
}

struct Inner {
    config: HeartbeatConfig,
    clock: Arc<dyn Clock>,
    rng: Mutex<Box<dyn DeterministicRng>>,
    mood: SharedMood,
    sink: Arc<dyn CommandSink>,
    generator: Option<Arc<dyn Generator>>,
    pool: Vec<AutonomousAction>,
    fallbacks: Vec<String>,
    last_activity: Mutex<DateTime<Utc>>,
    paused: AtomicBool,
    generations: Mutex<Vec<JoinHandle<()>>>,
}

impl Inner {
    fn idle_secs(&self) -> f64 {
        let since = *self.last_activity.lock().unwrap_or_else(PoisonError::into_inner);
        self.clock.seconds_since(since)
    }

    fn next_interval(&self) -> Duration {
        let idle = self.idle_secs();
        let chaos = self.mood.chaos_multiplier();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        compute_interval(&self.config, idle, chaos, rng.as_mut())
    }

    fn plan(&self) -> WakePlan {
        if self.paused.load(Ordering::Acquire) {
            return WakePlan::Quiet;
        }
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        plan_wake(&self.config, &self.mood, &self.pool, &self.fallbacks, rng.as_mut())
    }

    fn spawn_generation(&self, request: GenerationRequest) {
        let sink = Arc::clone(&self.sink);
        let Some(generator) = self.generator.clone() else {
            debug!("no generator configured; speaking fallback line");
            let fallback = request.fallback.clone();
            sink.submit(request.into_command(fallback));
            return;
        };

        let handle = tokio::spawn(async move {
            deliver(generator.as_ref(), request, sink.as_ref()).await;
        });

        let mut generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        generations.retain(|h| !h.is_finished());
        generations.push(handle);
    }

    fn abort_generations(&self) {
        let mut generations = self.generations.lock().unwrap_or_else(PoisonError::into_inner);
        for handle in generations.drain(..) {
            handle.abort();
        }
    }
}

/// Sleeps for `duration` unless a stop is requested first. Returns `false`
/// when the loop should exit.
async fn sleep_or_stop(duration: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    if *stop.borrow() {
        return false;
    }
    tokio::select! {
        () = tokio::time::sleep(duration) => !*stop.borrow(),
        changed = stop.changed() => changed.is_ok() && !*stop.borrow(),
    }
}

async fn run_loop(inner: Arc<Inner>, mut stop: watch::Receiver<bool>) {
    info!("heartbeat started");
    loop {
        let interval = inner.next_interval();
        debug!(interval_ms = interval.as_millis(), "heartbeat sleeping");
        if !sleep_or_stop(interval, &mut stop).await {
            break;
        }

        match inner.plan() {
            WakePlan::Quiet => debug!("heartbeat woke; staying quiet"),
            WakePlan::Generate(request) => {
                debug!("heartbeat requesting generated line");
                inner.spawn_generation(request);
            }
            WakePlan::Single(command) => {
                debug!(tag = %command.tag, "heartbeat emitting action");
                inner.sink.submit(command);
            }
            WakePlan::Burst(commands) => {
                debug!(count = commands.len(), "heartbeat emitting burst");
                let mut first = true;
                for command in commands {
                    if !first && !sleep_or_stop(inner.config.burst_spacing, &mut stop).await {
                        break;
                    }
                    first = false;
                    inner.sink.submit(command);
                }
            }
        }
    }
    info!("heartbeat stopped");
}

/// Autonomous background scheduler.
///
/// Emits commands on its own at mood- and idleness-dependent intervals.
/// There is no automatic restart if the loop task dies; callers observe
/// that through [`is_running`](Self::is_running).
pub struct Heartbeat {
    inner: Arc<Inner>,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Heartbeat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Heartbeat")
            .field("running", &self.is_running())
            .field("paused", &self.is_paused())
            .finish_non_exhaustive()
    }
}

impl Heartbeat {
    /// Creates a stopped heartbeat with the standard action pool.
    #[must_use]
    pub fn new(config: HeartbeatConfig, deps: HeartbeatDeps) -> Self {
        Self::with_pool(config, deps, AutonomousAction::standard_pool())
    }

    /// Creates a stopped heartbeat drawing from `pool`.
    #[must_use]
    pub fn with_pool(config: HeartbeatConfig, deps: HeartbeatDeps, pool: Vec<AutonomousAction>) -> Self {
        let now = deps.clock.now();
        let (stop_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                config,
                clock: deps.clock,
                rng: Mutex::new(deps.rng),
                mood: deps.mood,
                sink: deps.sink,
                generator: deps.generator,
                pool,
                fallbacks: standard_fallback_lines(),
                last_activity: Mutex::new(now),
                paused: AtomicBool::new(false),
                generations: Mutex::new(Vec::new()),
            }),
            stop_tx,
            task: Mutex::new(None),
        }
    }

    /// Spawns the loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `HeartbeatError::AlreadyRunning` if the loop is alive and
    /// `HeartbeatError::Runtime` outside a tokio runtime.
    pub fn start(&self) -> Result<(), HeartbeatError> {
        let runtime = Handle::try_current().map_err(|e| HeartbeatError::Runtime(e.to_string()))?;
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Err(HeartbeatError::AlreadyRunning);
        }

        self.stop_tx.send_replace(false);
        let stop_rx = self.stop_tx.subscribe();
        *task = Some(runtime.spawn(run_loop(Arc::clone(&self.inner), stop_rx)));
        Ok(())
    }

    /// Requests loop exit and waits for it, bounded by the configured stop
    /// timeout. In-flight generation requests are aborted so nothing
    /// submits after this returns.
    ///
    /// # Errors
    ///
    /// Returns `HeartbeatError::StopTimeout` if the loop had to be aborted.
    #[instrument(skip(self))]
    pub async fn stop(&self) -> Result<(), HeartbeatError> {
        self.stop_tx.send_replace(true);
        self.inner.abort_generations();

        let handle = self.task.lock().unwrap_or_else(PoisonError::into_inner).take();
        let Some(mut handle) = handle else {
            return Ok(());
        };

        let timeout = self.inner.config.stop_timeout;
        let joined = tokio::time::timeout(timeout, &mut handle).await.is_ok();
        // A wake racing the stop signal may have spawned one more request.
        self.inner.abort_generations();
        if joined {
            Ok(())
        } else {
            warn!(?timeout, "heartbeat did not stop in time; aborting");
            handle.abort();
            Err(HeartbeatError::StopTimeout(timeout))
        }
    }

    /// Resets the idle timer. Callable from any thread.
    pub fn update_activity(&self) {
        let now = self.inner.clock.now();
        *self
            .inner
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Seconds since the last recorded activity.
    #[must_use]
    pub fn idle_secs(&self) -> f64 {
        self.inner.idle_secs()
    }

    /// Keeps the loop running but makes every wake quiet.
    pub fn pause(&self) {
        if !self.inner.paused.swap(true, Ordering::AcqRel) {
            info!("heartbeat paused");
        }
    }

    /// Undoes [`pause`](Self::pause).
    pub fn resume(&self) {
        if self.inner.paused.swap(false, Ordering::AcqRel) {
            info!("heartbeat resumed");
        }
    }

    /// Whether wakes are currently suppressed.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.inner.paused.load(Ordering::Acquire)
    }

    /// Whether the loop task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Computes an interval the way the loop would right now.
    #[must_use]
    pub fn next_interval(&self) -> Duration {
        self.inner.next_interval()
    }
}
