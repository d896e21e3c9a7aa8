//! The `(rank, sequence)`-ordered work queue shared by all workers.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Semaphore;
use wraith_core::command::ActionCommand;

use crate::registry::HandlerCategory;

/// Rank reserved for shutdown sentinels; below every real tier.
pub(crate) const SENTINEL_RANK: u8 = 0;

/// What a worker finds when it dequeues.
#[derive(Debug)]
pub(crate) enum Payload {
    /// Real work, already resolved to its category.
    Command {
        command: ActionCommand,
        category: HandlerCategory,
    },
    /// Tells the worker that dequeued it to exit.
    Sentinel,
}

#[derive(Debug)]
pub(crate) struct QueueEntry {
    pub rank: u8,
    pub sequence: u64,
    pub payload: Payload,
}

impl QueueEntry {
    pub(crate) fn is_sentinel(&self) -> bool {
        matches!(self.payload, Payload::Sentinel)
    }
}

// Ordering: (rank ASC, sequence ASC). The heap holds `Reverse` so the
// smallest key pops first.
impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.sequence == other.sequence
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

#[derive(Debug, Default)]
struct Heap {
    entries: BinaryHeap<Reverse<QueueEntry>>,
    closed: bool,
}

/// Min-heap guarded by a mutex, with one semaphore permit per entry so an
/// idle worker parks on `acquire` until there is something to pop.
#[derive(Debug)]
pub(crate) struct PriorityQueue {
    heap: Mutex<Heap>,
    available: Semaphore,
}

impl PriorityQueue {
    pub(crate) fn new() -> Self {
        Self {
            heap: Mutex::new(Heap::default()),
            available: Semaphore::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Heap> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Never blocks beyond the heap lock. Returns `false`, leaving the queue
    /// untouched, once [`close`](Self::close) has run.
    pub(crate) fn push(&self, entry: QueueEntry) -> bool {
        let mut heap = self.lock();
        if heap.closed {
            return false;
        }
        heap.entries.push(Reverse(entry));
        drop(heap);
        self.available.add_permits(1);
        true
    }

    /// Refuses further pushes and queues `sentinels`, atomically with
    /// respect to [`push`](Self::push).
    pub(crate) fn close(&self, sentinels: impl IntoIterator<Item = QueueEntry>) {
        let mut heap = self.lock();
        heap.closed = true;
        let before = heap.entries.len();
        heap.entries.extend(sentinels.into_iter().map(Reverse));
        let added = heap.entries.len() - before;
        drop(heap);
        self.available.add_permits(added);
    }

    /// Waits for an entry and pops the lowest key. Returns `None` only if
    /// the queue has been closed.
    pub(crate) async fn pop(&self) -> Option<QueueEntry> {
        let permit = self.available.acquire().await.ok()?;
        permit.forget();
        self.lock().entries.pop().map(|Reverse(entry)| entry)
    }

    /// Real commands waiting, excluding sentinels.
    pub(crate) fn pending_commands(&self) -> usize {
        self.lock()
            .entries
            .iter()
            .filter(|Reverse(entry)| !entry.is_sentinel())
            .count()
    }
}
