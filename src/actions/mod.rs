//! The document actions.
//!
//! Each submodule follows the microsvc convention (`ACTION`, `params()`,
//! `handle`) and also exposes a typed function, so one action can reuse
//! another directly instead of going back through dispatch.

pub mod convert_object_id;
pub mod find_one;
pub mod find_one_and_sort;
pub mod find_one_and_update;

use serde_json::Value as Json;

use crate::config::ServiceConfig;
use crate::events::{EventOutbox, EventReceiver};
use crate::microsvc::Service;
use crate::store::DocumentStore;
use crate::value::{document_to_json, Document, Value};

pub use convert_object_id::convert_object_id;
pub use find_one::find_one;
pub use find_one_and_sort::find_one_and_sort;
pub use find_one_and_update::{find_one_and_update, UpsertOptionsInput};

/// Register all four document actions on `service`.
pub fn attach<S: DocumentStore + 'static>(service: Service<S>) -> Service<S> {
    crate::register_actions!(
        service,
        convert_object_id,
        find_one,
        find_one_and_sort,
        find_one_and_update,
    )
}

/// A service named `name` over `store` with every document action
/// registered, emitting change events into `outbox`.
pub fn service<S: DocumentStore + 'static>(
    name: impl Into<String>,
    store: S,
    outbox: EventOutbox,
) -> Service<S> {
    attach(Service::new(name, store).with_outbox(outbox))
}

/// A service named after `config.service_name` over `store`, emitting change
/// events into a channel of `config.event_capacity`. Hand the receiver to an
/// [`EventDispatcherThread`](crate::events::EventDispatcherThread).
pub fn service_from_config<S: DocumentStore + 'static>(
    config: &ServiceConfig,
    store: S,
) -> (Service<S>, EventReceiver) {
    let (outbox, receiver) = EventOutbox::bounded(config.event_capacity);
    tracing::info!(
        service = %config.service_name,
        namespace = %config.namespace,
        node_id = %config.node_id,
        event_capacity = config.event_capacity,
        "document service configured"
    );
    (service(config.service_name.clone(), store, outbox), receiver)
}

/// Render the `_id` of an optional document for log records.
pub(crate) fn describe_id(doc: Option<&Document>) -> String {
    match doc.and_then(|d| d.get("_id")) {
        Some(Value::ObjectId(id)) => id.to_hex(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => Json::from(other.clone()).to_string(),
        None => "null".to_string(),
    }
}

/// Plain-value rendering of an optional document; `None` becomes `null`.
pub(crate) fn to_response(doc: Option<&Document>) -> Json {
    doc.map(document_to_json).unwrap_or(Json::Null)
}
