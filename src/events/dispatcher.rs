//! Threaded dispatcher that drains the change-event channel into a bus.

use std::sync::mpsc::{channel, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::bus::{PublishError, Publisher};

use super::{ChangeEvent, EventOrigin, EventReceiver};

/// Statistics from the dispatcher thread.
#[derive(Debug, Default, Clone)]
pub struct DispatchStats {
    pub published: usize,
    pub failed: usize,
    pub polls: usize,
}

/// A background thread that publishes change events as they are emitted.
///
/// Delivery is best effort: an event the publisher rejects is logged and
/// counted, never retried.
///
/// ## Example
///
/// ```ignore
/// use docstore_actions::bus::InMemoryQueue;
/// use docstore_actions::events::{EventDispatcherThread, EventOutbox};
///
/// let (outbox, receiver) = EventOutbox::bounded(1024);
/// let queue = InMemoryQueue::new();
/// let dispatcher = EventDispatcherThread::spawn(receiver, queue.clone(), Duration::from_millis(50));
///
/// // ... hand `outbox` to the service, serve requests ...
///
/// let stats = dispatcher.stop();
/// ```
pub struct EventDispatcherThread {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<DispatchStats>>,
}

impl EventDispatcherThread {
    /// Spawn the dispatcher. `poll_interval` bounds how long a stop request
    /// can go unnoticed while the channel is idle.
    pub fn spawn<P>(receiver: EventReceiver, publisher: P, poll_interval: Duration) -> Self
    where
        P: Publisher + 'static,
    {
        Self::spawn_with_origin(receiver, publisher, poll_interval, None)
    }

    /// Like [`spawn`](Self::spawn), stamping every published event with the
    /// node id and namespace from `origin`.
    pub fn spawn_with_origin<P>(
        receiver: EventReceiver,
        publisher: P,
        poll_interval: Duration,
        origin: Option<EventOrigin>,
    ) -> Self
    where
        P: Publisher + 'static,
    {
        let (stop_tx, stop_rx) = channel();

        let handle = thread::spawn(move || {
            let mut stats = DispatchStats::default();

            loop {
                match stop_rx.try_recv() {
                    Ok(()) | Err(TryRecvError::Disconnected) => break,
                    Err(TryRecvError::Empty) => {}
                }

                stats.polls += 1;

                let event = match receiver.recv_timeout(poll_interval) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                };

                match publish(&publisher, origin.as_ref(), &event) {
                    Ok(()) => stats.published += 1,
                    Err(err) => {
                        tracing::warn!(event = %event.name, id = %event.id, error = %err, "failed to publish change event");
                        stats.failed += 1;
                    }
                }
            }

            // Flush whatever is already queued.
            for event in receiver.drain() {
                match publish(&publisher, origin.as_ref(), &event) {
                    Ok(()) => stats.published += 1,
                    Err(_) => stats.failed += 1,
                }
            }

            stats
        });

        Self {
            stop_tx,
            handle: Some(handle),
        }
    }

    /// Stop the dispatcher and wait for it to finish. Returns stats.
    pub fn stop(mut self) -> DispatchStats {
        let _ = self.stop_tx.send(());
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_default(),
            None => DispatchStats::default(),
        }
    }
}

fn publish<P: Publisher>(
    publisher: &P,
    origin: Option<&EventOrigin>,
    event: &ChangeEvent,
) -> Result<(), PublishError> {
    let bus_event = event.to_bus_event()?;
    let bus_event = match origin {
        Some(origin) => origin.stamp(bus_event),
        None => bus_event,
    };
    publisher.publish(bus_event)
}

impl Drop for EventDispatcherThread {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(());
    }
}
