//! The priority dispatch engine.
//!
//! All producers funnel through [`DispatchEngine::submit`]. A fixed pool of
//! worker tasks drains the queue in `(tier, sequence)` order and runs each
//! command on the handler registered for its category.
//!
//! # Starvation
//!
//! Ordering is strict: FIFO within a tier, no priority aging. A continuous
//! stream of `High` submissions therefore starves `Low` work indefinitely.
//! This is accepted so that visual effects always land immediately.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use wraith_core::command::{ActionCommand, Tier};
use wraith_core::sink::CommandSink;

use crate::config::DispatchConfig;
use crate::error::{EngineError, HandlerError};
use crate::handler::HandlerSet;
use crate::queue::{Payload, PriorityQueue, QueueEntry, SENTINEL_RANK};
use crate::registry::{ActionRegistry, HandlerCategory};

/// Outcome of a `submit` call, for observability only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The command was queued.
    Queued {
        /// Position in the global submission order.
        sequence: u64,
        /// Tier it was queued under.
        tier: Tier,
    },
    /// The command was malformed or its tag unknown; it was logged and dropped.
    Dropped,
    /// The engine is shutting down; the command was accepted and ignored.
    Ignored,
}

/// Counters describing engine activity since start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Commands queued.
    pub queued: u64,
    /// Commands dropped as malformed or unknown.
    pub dropped: u64,
    /// Commands ignored during shutdown.
    pub ignored: u64,
    /// Commands whose handler completed successfully.
    pub executed: u64,
    /// Commands whose handler returned an error or panicked.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    queued: AtomicU64,
    dropped: AtomicU64,
    ignored: AtomicU64,
    executed: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug)]
struct Shared {
    queue: PriorityQueue,
    registry: ActionRegistry,
    handlers: HandlerSet,
    sequence: AtomicU64,
    shutting_down: AtomicBool,
    live_workers: AtomicUsize,
    counters: Counters,
}

impl Shared {
    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    async fn execute(
        &self,
        worker: usize,
        sequence: u64,
        command: ActionCommand,
        category: HandlerCategory,
    ) {
        let tag = command.tag.clone();
        let Some(handler) = self.handlers.get(category) else {
            warn!(worker, tag = %tag, ?category, "no handler registered for category; dropping");
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };
        let speech = self.handlers.speech();

        debug!(worker, sequence, tag = %tag, correlation_id = %command.correlation_id, "executing command");

        // Own task so a panicking handler surfaces as a JoinError instead of
        // unwinding through the worker.
        let run = tokio::spawn(async move {
            handler.handle(&command).await?;
            if let (Some(text), Some(renderer)) = (command.speech.as_deref(), speech) {
                renderer.speak(text).await?;
            }
            Ok::<(), HandlerError>(())
        });

        match run.await {
            Ok(Ok(())) => {
                self.counters.executed.fetch_add(1, Ordering::Relaxed);
            }
            Ok(Err(err)) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(worker, sequence, tag = %tag, error = %err, "handler failed");
            }
            Err(join_err) if join_err.is_panic() => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(worker, sequence, tag = %tag, "handler panicked");
            }
            Err(join_err) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(worker, sequence, tag = %tag, error = %join_err, "handler task cancelled");
            }
        }
    }
}

/// Counts a worker as live until it is dropped, however its task ends.
struct LiveWorker<'a>(&'a AtomicUsize);

impl Drop for LiveWorker<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

async fn run_worker(worker: usize, shared: Arc<Shared>) {
    let _live = LiveWorker(&shared.live_workers);
    debug!(worker, "worker started");
    while let Some(entry) = shared.queue.pop().await {
        match entry.payload {
            Payload::Sentinel => break,
            Payload::Command { command, category } => {
                shared.execute(worker, entry.sequence, command, category).await;
            }
        }
    }
    debug!(worker, "worker exited");
}

/// Bounded worker pool draining a priority queue.
#[derive(Debug)]
pub struct DispatchEngine {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl DispatchEngine {
    /// Spawns `config.workers` workers on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Configuration` for an invalid config and
    /// `EngineError::Runtime` when called outside a tokio runtime.
    pub fn start(
        config: &DispatchConfig,
        registry: ActionRegistry,
        handlers: HandlerSet,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| EngineError::Runtime(e.to_string()))?;

        let shared = Arc::new(Shared {
            queue: PriorityQueue::new(),
            registry,
            handlers,
            sequence: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
            live_workers: AtomicUsize::new(config.workers),
            counters: Counters::default(),
        });

        let workers = (0..config.workers)
            .map(|worker| runtime.spawn(run_worker(worker, Arc::clone(&shared))))
            .collect();

        info!(workers = config.workers, "dispatch engine started");

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            worker_count: config.workers,
        })
    }

    /// Queues `command` under the tier of its category. Non-blocking and
    /// callable from any thread; never fails.
    pub fn submit(&self, command: ActionCommand) -> Submission {
        let counters = &self.shared.counters;

        if self.shared.shutting_down.load(Ordering::Acquire) {
            debug!(tag = %command.tag, "engine shutting down; ignoring command");
            counters.ignored.fetch_add(1, Ordering::Relaxed);
            return Submission::Ignored;
        }

        if command.tag.trim().is_empty() {
            warn!(correlation_id = %command.correlation_id, "command has empty tag; dropping");
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            return Submission::Dropped;
        }

        let Some(category) = self.shared.registry.resolve(&command.tag) else {
            warn!(tag = %command.tag, "unknown action tag; dropping");
            counters.dropped.fetch_add(1, Ordering::Relaxed);
            return Submission::Dropped;
        };

        let tier = category.tier();
        let sequence = self.shared.next_sequence();
        let tag = command.tag.clone();
        let queued = self.shared.queue.push(QueueEntry {
            rank: tier.rank(),
            sequence,
            payload: Payload::Command { command, category },
        });
        if !queued {
            debug!(tag = %tag, "engine shut down while submitting; ignoring command");
            counters.ignored.fetch_add(1, Ordering::Relaxed);
            return Submission::Ignored;
        }
        debug!(tag = %tag, sequence, ?tier, "command queued");
        counters.queued.fetch_add(1, Ordering::Relaxed);

        Submission::Queued { sequence, tier }
    }

    /// Parses the `{action, params, speech}` schema and submits the result.
    /// Malformed input is logged and dropped.
    pub fn submit_json(&self, value: &serde_json::Value) -> Submission {
        match ActionCommand::from_json(value) {
            Ok(command) => self.submit(command),
            Err(err) => {
                warn!(error = %err, "malformed command; dropping");
                self.shared.counters.dropped.fetch_add(1, Ordering::Relaxed);
                Submission::Dropped
            }
        }
    }

    /// Stops the pool: flips the shutdown flag and queues one sentinel per
    /// worker ahead of all pending work. Returns immediately; use
    /// [`join`](Self::join) to wait. Idempotent.
    pub fn shutdown(&self) {
        if self.shared.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }

        info!(
            workers = self.worker_count,
            pending = self.shared.queue.pending_commands(),
            "dispatch engine shutting down"
        );

        let sentinels: Vec<QueueEntry> = (0..self.worker_count)
            .map(|_| QueueEntry {
                rank: SENTINEL_RANK,
                sequence: self.shared.next_sequence(),
                payload: Payload::Sentinel,
            })
            .collect();
        self.shared.queue.close(sentinels);
    }

    /// Waits up to `timeout` for every worker to exit.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::ShutdownTimeout` with the number of workers
    /// still alive when the bound elapses. Those workers stay tracked and a
    /// later `join` may collect them.
    #[instrument(skip(self))]
    pub async fn join(&self, timeout: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + timeout;
        let mut handles = std::mem::take(
            &mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner),
        );

        let mut remaining = Vec::new();
        for mut handle in handles.drain(..) {
            if tokio::time::timeout_at(deadline, &mut handle).await.is_err() {
                remaining.push(handle);
            }
        }

        if remaining.is_empty() {
            info!("all dispatch workers exited");
            return Ok(());
        }

        let alive = remaining.len();
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(remaining);
        warn!(alive, "dispatch workers did not exit in time");
        Err(EngineError::ShutdownTimeout { alive })
    }

    /// [`shutdown`](Self::shutdown) followed by [`join`](Self::join).
    ///
    /// # Errors
    ///
    /// See [`join`](Self::join).
    pub async fn shutdown_and_join(&self, timeout: Duration) -> Result<(), EngineError> {
        self.shutdown();
        self.join(timeout).await
    }

    /// Workers that have not exited yet. Accurate while a
    /// [`join`](Self::join) is in progress.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.shared.live_workers.load(Ordering::Acquire)
    }

    /// Configured pool size.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Real commands waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.shared.queue.pending_commands()
    }

    /// Whether `shutdown` has been called.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.shared.shutting_down.load(Ordering::Acquire)
    }

    /// The registry used to resolve tags.
    #[must_use]
    pub fn registry(&self) -> &ActionRegistry {
        &self.shared.registry
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let c = &self.shared.counters;
        EngineStats {
            queued: c.queued.load(Ordering::Relaxed),
            dropped: c.dropped.load(Ordering::Relaxed),
            ignored: c.ignored.load(Ordering::Relaxed),
            executed: c.executed.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
        }
    }
}

impl CommandSink for DispatchEngine {
    fn submit(&self, command: ActionCommand) {
        let _ = DispatchEngine::submit(self, command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::thread;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::handler::{ActionHandler, SpeechRenderer};

    /// Records the `id` param (or tag) of each command as it starts.
    #[derive(Default)]
    struct RecordingHandler {
        started: Mutex<Vec<String>>,
        delays: HashMap<String, Duration>,
        failing: HashSet<String>,
        panicking: HashSet<String>,
    }

    impl RecordingHandler {
        fn with_delay(mut self, id: &str, delay: Duration) -> Self {
            self.delays.insert(id.to_owned(), delay);
            self
        }

        fn failing_on(mut self, id: &str) -> Self {
            self.failing.insert(id.to_owned());
            self
        }

        fn panicking_on(mut self, id: &str) -> Self {
            self.panicking.insert(id.to_owned());
            self
        }

        fn started(&self) -> Vec<String> {
            self.started.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ActionHandler for RecordingHandler {
        async fn handle(&self, command: &ActionCommand) -> Result<(), HandlerError> {
            let id = command
                .param_str("id")
                .map_or_else(|| command.tag.clone(), str::to_owned);
            self.started.lock().unwrap().push(id.clone());

            if let Some(delay) = self.delays.get(&id) {
                tokio::time::sleep(*delay).await;
            }
            assert!(!self.panicking.contains(&id), "handler blew up on {id}");
            if self.failing.contains(&id) {
                return Err(HandlerError::Failed(format!("{id} failed")));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingSpeech {
        lines: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SpeechRenderer for RecordingSpeech {
        async fn speak(&self, text: &str) -> Result<(), HandlerError> {
            self.lines.lock().unwrap().push(text.to_owned());
            Ok(())
        }
    }

    fn engine_with(workers: usize, handler: &Arc<RecordingHandler>) -> DispatchEngine {
        let handlers = HandlerSet::new().with_fallback(Arc::clone(handler) as Arc<dyn ActionHandler>);
        DispatchEngine::start(
            &DispatchConfig::with_workers(workers),
            ActionRegistry::standard(),
            handlers,
        )
        .unwrap()
    }

    fn high(id: &str) -> ActionCommand {
        ActionCommand::new("glitch").with_param("id", id)
    }

    fn low(id: &str) -> ActionCommand {
        ActionCommand::new("cleanup_files").with_param("id", id)
    }

    async fn wait_for_started(handler: &RecordingHandler, count: usize) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let started = handler.started();
            if started.len() >= count || Instant::now() >= deadline {
                return started;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn wait_for_completed(engine: &DispatchEngine, count: u64) -> EngineStats {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let stats = engine.stats();
            if stats.executed + stats.failed >= count || Instant::now() >= deadline {
                return stats;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_high_tier_submitted_later_runs_before_pending_low_tier() {
        // Arrange: occupy the single worker so A and B both wait in the queue.
        let handler = Arc::new(RecordingHandler::default().with_delay("blocker", Duration::from_millis(150)));
        let engine = engine_with(1, &handler);
        engine.submit(low("blocker"));
        wait_for_started(&handler, 1).await;

        // Act
        engine.submit(low("A"));
        engine.submit(high("B"));
        let started = wait_for_started(&handler, 3).await;

        // Assert
        assert_eq!(started, vec!["blocker", "B", "A"]);
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_slow_low_then_low_then_high_executes_a_c_b() {
        // Arrange
        let handler = Arc::new(RecordingHandler::default().with_delay("A", Duration::from_millis(500)));
        let engine = engine_with(1, &handler);

        // Act
        engine.submit(low("A"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        engine.submit(low("B"));
        engine.submit(high("C"));
        let started = wait_for_started(&handler, 3).await;

        // Assert
        assert_eq!(started, vec!["A", "C", "B"]);
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_fifo_within_a_tier() {
        let handler = Arc::new(RecordingHandler::default().with_delay("blocker", Duration::from_millis(100)));
        let engine = engine_with(1, &handler);
        engine.submit(low("blocker"));
        wait_for_started(&handler, 1).await;

        for id in ["h1", "h2", "h3"] {
            engine.submit(high(id));
        }
        let started = wait_for_started(&handler, 4).await;

        assert_eq!(started, vec!["blocker", "h1", "h2", "h3"]);
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_live_workers_equals_pool_size_until_shutdown() {
        // Arrange
        let handler = Arc::new(RecordingHandler::default().failing_on("bad").panicking_on("worse"));
        let engine = engine_with(4, &handler);

        // Act: failures and panics must not cost a worker.
        engine.submit(low("bad"));
        engine.submit(high("worse"));
        for i in 0..20 {
            engine.submit(high(&format!("ok-{i}")));
        }
        let stats = wait_for_completed(&engine, 22).await;

        // Assert
        assert_eq!(stats.executed, 20);
        assert_eq!(stats.failed, 2);
        assert_eq!(engine.live_workers(), 4);
        assert_eq!(engine.worker_count(), 4);

        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();
        assert_eq!(engine.live_workers(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shutdown_latency_is_independent_of_backlog() {
        // Arrange: a deep backlog of 20ms actions across two workers.
        let mut handler = RecordingHandler::default();
        for i in 0..1000 {
            handler = handler.with_delay(&format!("slow-{i}"), Duration::from_millis(20));
        }
        let handler = Arc::new(handler);
        let engine = engine_with(2, &handler);
        for i in 0..1000 {
            engine.submit(low(&format!("slow-{i}")));
        }
        tokio::time::sleep(Duration::from_millis(30)).await;

        // Act
        let started_at = Instant::now();
        engine.shutdown();
        let joined = engine.join(Duration::from_millis(100)).await;

        // Assert
        assert!(joined.is_ok(), "workers did not exit: {joined:?}");
        assert!(started_at.elapsed() < Duration::from_millis(100));
        assert_eq!(engine.live_workers(), 0);
        assert!(engine.pending() > 900, "backlog should be abandoned, not drained");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_submit_after_shutdown_is_ignored_and_spawns_nothing() {
        let handler = Arc::new(RecordingHandler::default());
        let engine = engine_with(3, &handler);
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();

        let outcome = engine.submit(high("late"));
        engine.shutdown();

        assert_eq!(outcome, Submission::Ignored);
        assert_eq!(engine.live_workers(), 0);
        assert_eq!(engine.pending(), 0);
        assert_eq!(engine.stats().ignored, 1);
        assert!(handler.started().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_live_workers_counts_busy_worker_while_join_waits() {
        // Arrange
        let handler = Arc::new(RecordingHandler::default().with_delay("slow", Duration::from_millis(500)));
        let engine = Arc::new(engine_with(1, &handler));
        engine.submit(low("slow"));
        wait_for_started(&handler, 1).await;

        // Act
        engine.shutdown();
        let join = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.join(Duration::from_secs(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let during = engine.live_workers();

        // Assert
        assert_eq!(during, 1);
        assert!(!join.is_finished());
        join.await.unwrap().unwrap();
        assert_eq!(engine.live_workers(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_nothing_is_queued_once_shutdown_returns() {
        // Arrange: producers submit until they are turned away.
        let handler = Arc::new(RecordingHandler::default());
        let engine = Arc::new(engine_with(2, &handler));
        let producers: Vec<_> = (0..4)
            .map(|producer| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    let mut queued = 0_u64;
                    for i in 0..1_000_000 {
                        match DispatchEngine::submit(&engine, low(&format!("p{producer}-{i}"))) {
                            Submission::Queued { .. } => queued += 1,
                            Submission::Ignored => break,
                            Submission::Dropped => unreachable!("known tag was dropped"),
                        }
                    }
                    queued
                })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Act
        engine.shutdown();
        let pending_at_shutdown = engine.pending();
        let queued: u64 = producers.into_iter().map(|p| p.join().unwrap()).sum();
        engine.join(Duration::from_secs(1)).await.unwrap();

        // Assert
        assert_eq!(engine.pending(), pending_at_shutdown);
        let stats = engine.stats();
        assert_eq!(stats.queued, queued);
        assert_eq!(stats.executed + u64::try_from(engine.pending()).unwrap(), queued);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_each_command_runs_exactly_once() {
        // Arrange
        let handler = Arc::new(RecordingHandler::default());
        let engine = Arc::new(engine_with(4, &handler));

        // Act: 10 OS threads, 50 commands each, no coordination.
        let producers: Vec<_> = (0..10)
            .map(|producer| {
                let engine = Arc::clone(&engine);
                thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("p{producer}-{i}");
                        let command = if i % 2 == 0 { high(&id) } else { low(&id) };
                        engine.submit(command);
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        let stats = wait_for_completed(&engine, 500).await;

        // Assert
        let started = handler.started();
        let unique: HashSet<&String> = started.iter().collect();
        assert_eq!(stats.queued, 500);
        assert_eq!(stats.executed, 500);
        assert_eq!(started.len(), 500);
        assert_eq!(unique.len(), 500);
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_commands_are_dropped() {
        let handler = Arc::new(RecordingHandler::default());
        let engine = engine_with(1, &handler);

        assert_eq!(engine.submit(ActionCommand::new("summon_cat")), Submission::Dropped);
        assert_eq!(engine.submit(ActionCommand::new("")), Submission::Dropped);
        assert_eq!(engine.submit_json(&json!({ "params": {} })), Submission::Dropped);
        assert_eq!(
            engine.submit_json(&json!({ "action": "glitch", "params": "loud" })),
            Submission::Dropped
        );

        assert_eq!(engine.stats().dropped, 4);
        assert_eq!(engine.pending(), 0);
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_json_queues_under_category_tier() {
        let handler = Arc::new(RecordingHandler::default());
        let engine = engine_with(1, &handler);

        let outcome = engine.submit_json(&json!({ "action": "screen_shake", "params": { "id": "s" } }));

        assert!(matches!(outcome, Submission::Queued { tier: Tier::High, .. }));
        assert_eq!(wait_for_started(&handler, 1).await, vec!["s"]);
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_sequence_numbers_are_unique_and_increasing() {
        let handler = Arc::new(RecordingHandler::default());
        let engine = engine_with(1, &handler);

        let sequences: Vec<u64> = (0..5)
            .filter_map(|i| match engine.submit(low(&format!("n{i}"))) {
                Submission::Queued { sequence, .. } => Some(sequence),
                _ => None,
            })
            .collect();

        assert_eq!(sequences.len(), 5);
        assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_speech_is_rendered_after_handler() {
        let handler = Arc::new(RecordingHandler::default());
        let speech = Arc::new(RecordingSpeech::default());
        let handlers = HandlerSet::new()
            .with_fallback(Arc::clone(&handler) as Arc<dyn ActionHandler>)
            .with_speech(Arc::clone(&speech) as Arc<dyn SpeechRenderer>);
        let engine = DispatchEngine::start(&DispatchConfig::with_workers(1), ActionRegistry::standard(), handlers)
            .unwrap();

        engine.submit(ActionCommand::new("speak").with_speech("Why did you do that?"));
        wait_for_completed(&engine, 1).await;

        assert_eq!(*speech.lines.lock().unwrap(), vec!["Why did you do that?"]);
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_category_without_handler_is_dropped_at_execution() {
        let handler = Arc::new(RecordingHandler::default());
        let handlers = HandlerSet::new()
            .with_handler(HandlerCategory::Visual, Arc::clone(&handler) as Arc<dyn ActionHandler>);
        let engine = DispatchEngine::start(&DispatchConfig::with_workers(1), ActionRegistry::standard(), handlers)
            .unwrap();

        engine.submit(low("no-system-handler"));
        engine.submit(high("visual"));
        wait_for_started(&handler, 1).await;
        let deadline = Instant::now() + Duration::from_secs(5);
        while engine.stats().dropped == 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        engine.shutdown_and_join(Duration::from_secs(1)).await.unwrap();

        assert_eq!(handler.started(), vec!["visual"]);
        assert_eq!(engine.stats().dropped, 1);
    }

    #[test]
    fn test_start_outside_runtime_is_an_error() {
        let result = DispatchEngine::start(
            &DispatchConfig::default(),
            ActionRegistry::standard(),
            HandlerSet::new(),
        );
        assert!(matches!(result, Err(EngineError::Runtime(_))));
    }

    #[tokio::test]
    async fn test_zero_workers_is_rejected() {
        let result = DispatchEngine::start(
            &DispatchConfig::with_workers(0),
            ActionRegistry::standard(),
            HandlerSet::new(),
        );
        assert!(matches!(result, Err(EngineError::Configuration(_))));
    }
}
