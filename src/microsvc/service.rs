//! Service: action registry and dispatch.
//!
//! `Service<S>` owns a name, a store, a change-event outbox, a validator and
//! a set of named actions. Each action declares a parameter schema, compiled
//! once at registration, and a handler that receives a `Context<S>`.
//!
//! ## Example
//!
//! ```ignore
//! use docstore_actions::microsvc::Service;
//! use docstore_actions::validator::Schema;
//! use serde_json::json;
//!
//! let service = Service::new("products", store)
//!     .action("ping", Schema::object(), |_ctx| Ok(json!({ "pong": true })));
//!
//! let result = service.dispatch("ping", json!({}));
//! ```

use std::collections::HashMap;

use serde_json::Value as Json;

use super::context::Context;
use super::error::ActionError;
use crate::events::EventOutbox;
use crate::validator::{Check, ParamSchema, SchemaValidator, Validator};

type Handler<S> = Box<dyn Fn(&Context<S>) -> Result<Json, ActionError> + Send + Sync>;

/// A registered action: its declared schema, the compiled check, and the
/// handler.
struct Action<S> {
    schema: ParamSchema,
    check: Check,
    handle: Handler<S>,
}

/// Resolves qualified `<service>.<action>` names and invokes them.
pub trait ActionCaller: Send + Sync {
    fn call(&self, action: &str, params: Json) -> Result<Json, ActionError>;
}

/// A microservice exposing named actions over a store.
pub struct Service<S> {
    name: String,
    store: S,
    outbox: EventOutbox,
    validator: Box<dyn Validator>,
    actions: HashMap<String, Action<S>>,
}

impl<S: Send + Sync + 'static> Service<S> {
    /// Create a service with the default [`SchemaValidator`] and no event
    /// delivery. Attach an outbox with [`with_outbox`](Self::with_outbox).
    pub fn new(name: impl Into<String>, store: S) -> Self {
        Self {
            name: name.into(),
            store,
            outbox: EventOutbox::disabled(),
            validator: Box::new(SchemaValidator::new()),
            actions: HashMap::new(),
        }
    }

    /// Deliver change events through `outbox`.
    pub fn with_outbox(mut self, outbox: EventOutbox) -> Self {
        self.outbox = outbox;
        self
    }

    /// Swap the validator. Already-registered schemas are recompiled.
    pub fn with_validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validator = Box::new(validator);
        for action in self.actions.values_mut() {
            action.check = self.validator.compile(&action.schema);
        }
        self
    }

    /// Register an action.
    ///
    /// Returns `self` for chaining. Registering the
    /// same name twice replaces the earlier action.
    pub fn action<F>(mut self, name: &str, schema: impl Into<ParamSchema>, handler: F) -> Self
    where
        F: Fn(&Context<S>) -> Result<Json, ActionError> + Send + Sync + 'static,
    {
        let schema = schema.into();
        let check = self.validator.compile(&schema);
        self.actions.insert(
            name.to_string(),
            Action {
                schema,
                check,
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Dispatch an action by its local name.
    ///
    /// Looks up the action, runs its compiled check against the params, then
    /// calls the handler with a fresh `Context`.
    pub fn dispatch(&self, action: &str, params: Json) -> Result<Json, ActionError> {
        let registered = self
            .actions
            .get(action)
            .ok_or_else(|| ActionError::UnknownAction(action.to_string()))?;

        tracing::debug!(service = %self.name, action, "dispatching action");

        (registered.check)(&params)?;

        let ctx = Context::new(action, &self.name, params, &self.store, &self.outbox);
        (registered.handle)(&ctx)
    }

    /// Dispatch an `ActionRequest`, returning an `ActionResponse`.
    pub fn dispatch_request(&self, request: &ActionRequest) -> ActionResponse {
        match self.dispatch(&request.action, request.params.clone()) {
            Ok(value) => ActionResponse {
                status: 200,
                body: value,
            },
            Err(e) => ActionResponse {
                status: e.status_code(),
                body: e.to_body(),
            },
        }
    }

    /// List registered action names.
    pub fn actions(&self) -> Vec<&str> {
        self.actions.keys().map(|s| s.as_str()).collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn outbox(&self) -> &EventOutbox {
        &self.outbox
    }
}

impl<S: Send + Sync + 'static> ActionCaller for Service<S> {
    /// Only names qualified with this service's own name resolve; anything
    /// else is an unknown action.
    fn call(&self, action: &str, params: Json) -> Result<Json, ActionError> {
        let local = action
            .strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .ok_or_else(|| ActionError::UnknownAction(action.to_string()))?;
        self.dispatch(local, params)
    }
}

// =============================================================================
// Request / Response types
// =============================================================================

/// An inbound action request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActionRequest {
    /// Local action name.
    pub action: String,
    /// JSON params.
    #[serde(default)]
    pub params: Json,
}

/// Response from dispatching an action.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ActionResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Action result or error body.
    pub body: Json,
}
