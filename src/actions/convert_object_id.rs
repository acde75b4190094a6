//! `convert-object-id`: normalize the identifier fields of a condition map.

use serde_json::Value as Json;

use crate::microsvc::{ActionError, Context};
use crate::normalize::normalize_identifiers;
use crate::store::DocumentStore;
use crate::validator::Schema;
use crate::value::{document_to_json, Document};

pub const ACTION: &str = "convert-object-id";

/// Any object.
pub fn params() -> Schema {
    Schema::object()
}

pub fn handle<S: DocumentStore>(ctx: &Context<'_, S>) -> Result<Json, ActionError> {
    let conditions = ctx.params::<Document>()?;
    let normalized = convert_object_id(&conditions)?;
    Ok(document_to_json(&normalized))
}

/// Typed entry point. Identical to [`normalize_identifiers`].
pub fn convert_object_id(conditions: &Document) -> Result<Document, ActionError> {
    normalize_identifiers(conditions)
}
