//! Change events - fire-and-forget notifications of successful writes.
//!
//! Actions never wait on delivery. [`EventOutbox::emit`] is a non-blocking
//! enqueue onto a bounded channel; when the channel is full or nobody is
//! draining it the event is dropped with a warning and the originating call
//! still succeeds. An [`EventDispatcherThread`] drains the channel into any
//! bus [`Publisher`](crate::bus::Publisher).

mod dispatcher;

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bus::Event;
use crate::config::ServiceConfig;
use crate::value::Document;

pub use dispatcher::{DispatchStats, EventDispatcherThread};

/// Notification that a document was created or updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: String,
    /// `<service-name>.update`
    pub name: String,
    /// The full stored document.
    pub payload: Document,
}

impl ChangeEvent {
    /// The `<service>.update` event for a stored document.
    pub fn update(service_name: &str, payload: Document) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: format!("{}.update", service_name),
            payload,
        }
    }

    /// Convert to a bus event with a JSON payload.
    pub fn to_bus_event(&self) -> Result<Event, serde_json::Error> {
        Event::json(self.id.clone(), self.name.clone(), &self.payload)
    }
}

/// Metadata key naming the node that produced an event.
pub const NODE_ID_KEY: &str = "node-id";
/// Metadata key naming the deployment namespace.
pub const NAMESPACE_KEY: &str = "namespace";

/// Where published events come from. Stamped onto every bus event as
/// metadata so consumers can tell nodes and environments apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventOrigin {
    pub node_id: String,
    pub namespace: String,
}

impl EventOrigin {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            node_id: config.node_id.clone(),
            namespace: config.namespace.clone(),
        }
    }

    pub fn stamp(&self, event: Event) -> Event {
        event
            .with_metadata(NODE_ID_KEY, self.node_id.as_str())
            .with_metadata(NAMESPACE_KEY, self.namespace.as_str())
    }
}

/// What happened to an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    Queued,
    Dropped,
}

/// Sending half of the bounded change-event channel. Cheap to clone.
#[derive(Clone)]
pub struct EventOutbox {
    sender: Option<SyncSender<ChangeEvent>>,
}

impl EventOutbox {
    /// Create a bounded channel holding at most `capacity` undelivered
    /// events (minimum 1).
    pub fn bounded(capacity: usize) -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        (
            Self {
                sender: Some(sender),
            },
            EventReceiver { receiver },
        )
    }

    /// An outbox that discards every event.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Enqueue without blocking. Never fails the caller.
    pub fn emit(&self, event: ChangeEvent) -> EmitOutcome {
        let Some(sender) = &self.sender else {
            return EmitOutcome::Dropped;
        };

        match sender.try_send(event) {
            Ok(()) => EmitOutcome::Queued,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(event = %event.name, id = %event.id, "event outbox full, dropping change event");
                EmitOutcome::Dropped
            }
            Err(TrySendError::Disconnected(event)) => {
                tracing::warn!(event = %event.name, id = %event.id, "event outbox disconnected, dropping change event");
                EmitOutcome::Dropped
            }
        }
    }
}

/// Receiving half of the change-event channel.
pub struct EventReceiver {
    receiver: Receiver<ChangeEvent>,
}

impl EventReceiver {
    /// Take the next event if one is waiting.
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ChangeEvent, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Take every event currently waiting.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.receiver.try_iter().collect()
    }
}
