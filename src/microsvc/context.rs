//! Context passed to action handlers.
//!
//! Carries the validated params and explicit handles to everything a handler
//! may touch: the owning service's name, its document store and its change
//! event outbox. Nothing is looked up at call time.

use serde::de::DeserializeOwned;
use serde_json::Value as Json;

use super::error::ActionError;
use crate::events::EventOutbox;

/// The context passed to every action handler.
///
/// Generic over `S` (the store type) so handlers can use whatever store the
/// service is configured with.
pub struct Context<'a, S> {
    /// Local action name, e.g. `find-one`.
    action_name: String,
    /// Name of the service the action belongs to.
    service_name: &'a str,
    /// Params, already checked against the action's schema.
    params: Json,
    store: &'a S,
    outbox: &'a EventOutbox,
}

impl<'a, S> Context<'a, S> {
    /// Create a new context.
    pub fn new(
        action_name: impl Into<String>,
        service_name: &'a str,
        params: Json,
        store: &'a S,
        outbox: &'a EventOutbox,
    ) -> Self {
        Self {
            action_name: action_name.into(),
            service_name,
            params,
            store,
            outbox,
        }
    }

    /// Deserialize the params into a typed struct.
    pub fn params<T: DeserializeOwned>(&self) -> Result<T, ActionError> {
        serde_json::from_value(self.params.clone()).map_err(|e| ActionError::DecodeFailed(e.to_string()))
    }

    /// Get the raw JSON params.
    pub fn raw_params(&self) -> &Json {
        &self.params
    }

    pub fn action_name(&self) -> &str {
        &self.action_name
    }

    /// `<service>.<action>`
    pub fn qualified_action_name(&self) -> String {
        format!("{}.{}", self.service_name, self.action_name)
    }

    pub fn service_name(&self) -> &str {
        self.service_name
    }

    /// Get a reference to the document store.
    pub fn store(&self) -> &S {
        self.store
    }

    /// Get the change-event outbox.
    pub fn outbox(&self) -> &EventOutbox {
        self.outbox
    }
}
