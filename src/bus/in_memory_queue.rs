//! In-memory change-event log for tests and single-process deployments.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use super::{Event, PublishError, Publisher, Subscriber};

/// Append-only log of published events. Clones share the log and the read
/// cursor; [`new_subscriber`](Self::new_subscriber) gives a fresh cursor.
///
/// ```
/// use docstore_actions::bus::{Event, InMemoryQueue, Publisher, Subscriber};
///
/// let queue = InMemoryQueue::new();
/// queue.publish(Event::new("evt-1", "products.update", b"{}".to_vec())).unwrap();
///
/// let event = queue.poll(100).unwrap().unwrap();
/// assert_eq!(event.event_type, "products.update");
/// ```
#[derive(Clone, Default)]
pub struct InMemoryQueue {
    log: Arc<RwLock<Vec<Event>>>,
    cursor: Arc<AtomicUsize>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A reader over the same log, starting from the first event.
    pub fn new_subscriber(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            cursor: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Snapshot of every published event.
    pub fn events(&self) -> Vec<Event> {
        self.log.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Published event names, in publish order.
    pub fn event_types(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.event_type).collect()
    }

    pub fn len(&self) -> usize {
        self.log.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_event(&self) -> Result<Option<Event>, PublishError> {
        let log = self
            .log
            .read()
            .map_err(|_| PublishError::Rejected("change log lock poisoned".into()))?;
        let claimed = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |p| (p < log.len()).then_some(p + 1));
        Ok(claimed.ok().map(|position| log[position].clone()))
    }
}

impl Publisher for InMemoryQueue {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        self.log
            .write()
            .map_err(|_| PublishError::Rejected("change log lock poisoned".into()))?
            .push(event);
        Ok(())
    }
}

impl Subscriber for InMemoryQueue {
    fn poll(&self, timeout_ms: u64) -> Result<Option<Event>, PublishError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Some(event) = self.next_event()? {
                return Ok(Some(event));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}
