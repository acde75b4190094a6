//! microsvc: Convention-based action host.
//!
//! Build a document service by registering actions on a `Service`. Each
//! action declares a parameter schema and a handler; the handler receives a
//! `Context<S>` with the validated params, the store, and the change-event
//! outbox.
//!
//! ## Quick Start
//!
//! ```ignore
//! use docstore_actions::{actions, microsvc, EventOutbox, InMemoryDocumentStore};
//! use serde_json::json;
//!
//! let (outbox, events) = EventOutbox::bounded(1024);
//! let service = actions::service("products", InMemoryDocumentStore::new("products"), outbox);
//!
//! // Direct dispatch
//! let doc = service.dispatch("find-one", json!({ "sku": "A1" }))?;
//!
//! // Qualified call, as other services would make it
//! let doc = microsvc::ActionCaller::call(&service, "products.find-one", json!({ "sku": "A1" }))?;
//!
//! // HTTP transport (requires "http" feature)
//! // microsvc::serve(Arc::new(service), "0.0.0.0:3000").await?;
//! ```
//!
//! ## Action Convention
//!
//! Each action file follows this convention:
//!
//! ```ignore
//! // src/actions/find_one.rs
//!
//! pub const ACTION: &str = "find-one";
//!
//! pub fn params() -> Schema {
//!     Schema::object()
//! }
//!
//! pub fn handle<S: DocumentStore>(ctx: &microsvc::Context<S>) -> Result<Value, ActionError> {
//!     let conditions = ctx.params::<Document>()?;
//!     Ok(json!(find_one(ctx, &conditions)?))
//! }
//! ```

mod context;
mod error;
mod service;

pub use context::Context;
pub use error::ActionError;
pub use service::{ActionCaller, ActionRequest, ActionResponse, Service};

// HTTP transport (requires "http" feature)
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{router, serve};

/// Register action modules with a service using the convention pattern.
///
/// Each action module must export:
/// - `ACTION: &str`: the local action name
/// - `params() -> impl Into<ParamSchema>`: the parameter schema
/// - `handle(ctx) -> Result<Value, ActionError>`: the handler
///
/// # Example
/// ```ignore
/// let service = docstore_actions::register_actions!(
///     microsvc::Service::new("products", store),
///     actions::find_one,
///     actions::find_one_and_update,
/// );
/// ```
#[macro_export]
macro_rules! register_actions {
    ($service:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $service
        $(
            .action(
                $($seg)::+::ACTION,
                $($seg)::+::params(),
                $($seg)::+::handle,
            )
        )+
    };
}
