//! `find-one`: the most recently touched document matching a condition map.

use serde_json::Value as Json;

use super::{describe_id, to_response};
use crate::microsvc::{ActionError, Context};
use crate::normalize::normalize_identifiers;
use crate::store::{DocumentStore, Sort};
use crate::validator::Schema;
use crate::value::Document;

pub const ACTION: &str = "find-one";

/// The params are the conditions themselves; any object is accepted.
pub fn params() -> Schema {
    Schema::object()
}

pub fn handle<S: DocumentStore>(ctx: &Context<'_, S>) -> Result<Json, ActionError> {
    let conditions = ctx.params::<Document>()?;
    let found = find_one(ctx, &conditions)?;
    Ok(to_response(found.as_ref()))
}

/// Normalize `conditions`, then return the first match ordered by
/// `updatedAt` desc, `createdAt` desc.
pub fn find_one<S: DocumentStore>(
    ctx: &Context<'_, S>,
    conditions: &Document,
) -> Result<Option<Document>, ActionError> {
    let conditions = normalize_identifiers(conditions)?;
    let found = ctx.store().find_one(&conditions, &Sort::by_recency())?;

    tracing::info!(
        service = ctx.service_name(),
        action = ACTION,
        _id = %describe_id(found.as_ref()),
        "document lookup"
    );

    Ok(found)
}
