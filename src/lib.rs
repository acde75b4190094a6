//! Document persistence actions over a pluggable store.
//!
//! A [`microsvc::Service`] hosts four actions against one collection:
//! `convert-object-id`, `find-one`, `find-one-and-sort` and
//! `find-one-and-update`. Params are checked against declared schemas before
//! any handler runs, every successful upsert emits a `<service>.update`
//! [`events::ChangeEvent`], and upserts always answer with the same document
//! a subsequent `find-one` would return.

pub mod actions;
pub mod bus;
pub mod config;
pub mod events;
pub mod microsvc;
pub mod normalize;
pub mod store;
pub mod validator;
pub mod value;

pub use config::{ConfigError, ServiceConfig};
pub use events::{ChangeEvent, EventDispatcherThread, EventOrigin, EventOutbox};
pub use microsvc::{ActionCaller, ActionError, Service};
pub use store::{DocumentStore, InMemoryDocumentStore, Sort, StoreError, UpsertOptions};
pub use validator::{Schema, SchemaValidator, ValidationError, Validator};
pub use value::{Document, ObjectId, Value};
