/// Sliding-window history of pause events.
///
/// One writer appends at the newest end and evicts from the oldest end;
/// any number of readers take snapshots. Each append builds the next
/// snapshot off to the side and publishes it with a pointer swap, so the
/// read lock is only ever held long enough to clone an `Arc`.
use crate::event::{PauseEvent, RETENTION_WINDOW_NS};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::Arc;

/// Errors raised by [`SlidingWindowStore::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An event arrived with a time earlier than the newest retained event.
    /// The log being monitored is inconsistent; ingestion must stop.
    TimeInconsistency { newest: i64, attempted: i64 },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::TimeInconsistency { newest, attempted } => write!(
                f,
                "time inconsistency detected in the gc log: event at {attempted}ns follows event at {newest}ns"
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// An immutable view of the store at the moment it was taken.
///
/// Iteration runs oldest to newest and can be restarted any number of times.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    events: Arc<VecDeque<PauseEvent>>,
}

impl Snapshot {
    pub fn iter(&self) -> impl Iterator<Item = &PauseEvent> + '_ {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn oldest(&self) -> Option<PauseEvent> {
        self.events.front().copied()
    }

    pub fn newest(&self) -> Option<PauseEvent> {
        self.events.back().copied()
    }

    /// Sum of all retained pause durations.
    pub fn total_duration(&self) -> i64 {
        self.events.iter().map(PauseEvent::duration).sum()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a PauseEvent;
    type IntoIter = std::collections::vec_deque::Iter<'a, PauseEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Concurrent append/evict store bounded by a retention window.
#[derive(Debug)]
pub struct SlidingWindowStore {
    retention_ns: i64,
    published: RwLock<Arc<VecDeque<PauseEvent>>>,
    /// Serializes appends so the monotonicity check and publish are atomic.
    writer: Mutex<()>,
}

impl Default for SlidingWindowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SlidingWindowStore {
    /// An empty store with the standard 30 second window.
    pub fn new() -> Self {
        Self::with_retention(RETENTION_WINDOW_NS)
    }

    pub fn with_retention(retention_ns: i64) -> Self {
        Self {
            retention_ns,
            published: RwLock::new(Arc::new(VecDeque::new())),
            writer: Mutex::new(()),
        }
    }

    pub fn retention_ns(&self) -> i64 {
        self.retention_ns
    }

    /// Append an event at the newest end, then evict everything older than
    /// the retention window relative to it.
    ///
    /// Fails without touching the store if `event` is older than the
    /// current newest event.
    pub fn append(&self, event: PauseEvent) -> Result<(), StoreError> {
        let _guard = self.writer.lock();
        let current = self.snapshot();

        if let Some(newest) = current.newest() {
            if event.time() < newest.time() {
                return Err(StoreError::TimeInconsistency {
                    newest: newest.time(),
                    attempted: event.time(),
                });
            }
        }

        let mut next: VecDeque<PauseEvent> = (*current.events).clone();
        next.push_back(event);

        let mut evicted = 0usize;
        while next
            .front()
            .is_some_and(|oldest| event.time().saturating_sub(oldest.time()) > self.retention_ns)
        {
            next.pop_front();
            evicted += 1;
        }

        let retained = next.len();
        *self.published.write() = Arc::new(next);

        tracing::trace!(
            time = event.time(),
            duration = event.duration(),
            evicted,
            retained,
            "pause event appended"
        );
        Ok(())
    }

    /// Take a consistent view of the current contents.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            events: Arc::clone(&*self.published.read()),
        }
    }

    pub fn peek_newest(&self) -> Option<PauseEvent> {
        self.published.read().back().copied()
    }

    pub fn peek_oldest(&self) -> Option<PauseEvent> {
        self.published.read().front().copied()
    }

    pub fn len(&self) -> usize {
        self.published.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.published.read().is_empty()
    }
}
