//! Core publisher and subscriber traits for the service bus.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// An event to be published to the bus.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Unique identifier for this event
    pub id: String,
    /// Event type (e.g., "products.update")
    pub event_type: String,
    /// JSON payload
    pub payload: Vec<u8>,
    /// Optional metadata (headers, correlation IDs, etc.)
    pub metadata: Option<Vec<(String, String)>>,
}

impl Event {
    /// Create a new event with the given type and raw payload.
    pub fn new(id: impl Into<String>, event_type: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            event_type: event_type.into(),
            payload,
            metadata: None,
        }
    }

    /// Create an event with a JSON-serialized payload.
    pub fn json<T: Serialize>(
        id: impl Into<String>,
        event_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(payload)?;
        Ok(Self::new(id, event_type, bytes))
    }

    /// Decode the JSON payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Add metadata to the event.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.into()));
        self
    }

    /// Look up a metadata value.
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the payload as a string (if valid UTF-8).
    pub fn payload_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

/// Error type for publish operations.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    #[error("Event rejected: {0}")]
    Rejected(String),
    #[error("Publish timeout")]
    Timeout,
    #[error("Publish error: {0}")]
    Other(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::SerializationFailed(err.to_string())
    }
}

/// Trait for publishing events to a message bus.
///
/// Implementations might include:
/// - `InMemoryQueue` - For testing and single-process scenarios
/// - `NatsPublisher` - For NATS
/// - `RabbitMqPublisher` - For RabbitMQ
pub trait Publisher: Send + Sync {
    /// Publish a single event to the bus.
    fn publish(&self, event: Event) -> Result<(), PublishError>;
}

/// Trait for subscribing to events from a message bus.
///
/// This is a pull-based interface.
pub trait Subscriber: Send + Sync {
    /// Poll for the next event, blocking until one is available or timeout.
    fn poll(&self, timeout_ms: u64) -> Result<Option<Event>, PublishError>;
}
