//! Broadcast event bus with per-subscriber failure isolation.
//!
//! Publishers hand an event to every subscriber in registration order. A
//! subscriber that panics is logged and skipped; the remaining subscribers
//! and the publisher are unaffected.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

type Subscriber<E> = Arc<dyn Fn(&E) + Send + Sync + 'static>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Registry<E> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber<E>)>,
}

/// Thread-safe pub/sub hub. Cloning shares the same subscriber list.
pub struct EventBus<E> {
    registry: Arc<RwLock<Registry<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<E> EventBus<E> {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RwLock::new(Registry {
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Registers a subscriber that receives every published event.
    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.subscribers.push((id, Arc::new(subscriber)));
        id
    }

    /// Removes a subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        let before = registry.subscribers.len();
        registry.subscribers.retain(|(existing, _)| *existing != id);
        registry.subscribers.len() != before
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .len()
    }

    /// Delivers `event` to every subscriber and returns how many handled it
    /// without panicking.
    pub fn publish(&self, event: &E) -> usize {
        // Snapshot so subscribers may (un)subscribe while being notified.
        let subscribers: Vec<(SubscriptionId, Subscriber<E>)> = self
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .clone();

        let mut delivered = 0;
        for (id, subscriber) in subscribers {
            match catch_unwind(AssertUnwindSafe(|| subscriber(event))) {
                Ok(()) => delivered += 1,
                Err(_) => warn!(subscription = id.0, "event subscriber panicked; skipping"),
            }
        }
        delivered
    }
}
