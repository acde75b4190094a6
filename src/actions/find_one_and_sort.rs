//! `find-one-and-sort`: like `find-one`, with a caller-chosen order.

use serde::Deserialize;
use serde_json::Value as Json;

use super::{describe_id, to_response};
use crate::microsvc::{ActionError, Context};
use crate::normalize::normalize_identifiers;
use crate::store::{DocumentStore, Sort};
use crate::validator::Schema;
use crate::value::Document;

pub const ACTION: &str = "find-one-and-sort";

#[derive(Debug, Deserialize)]
struct Params {
    conditions: Document,
    #[serde(default)]
    sort: Document,
}

pub fn params() -> Schema {
    Schema::object()
        .key("conditions", Schema::object().required())
        .key("sort", Schema::object())
        .unknown(false)
}

pub fn handle<S: DocumentStore>(ctx: &Context<'_, S>) -> Result<Json, ActionError> {
    let Params { conditions, sort } = ctx.params()?;
    let found = find_one_and_sort(ctx, &conditions, &sort)?;
    Ok(to_response(found.as_ref()))
}

/// Normalize `conditions` and return the first match in `sort` order. An
/// empty `sort` means `updatedAt` desc with no tie-break.
pub fn find_one_and_sort<S: DocumentStore>(
    ctx: &Context<'_, S>,
    conditions: &Document,
    sort: &Document,
) -> Result<Option<Document>, ActionError> {
    let conditions = normalize_identifiers(conditions)?;
    let sort = if sort.is_empty() {
        Sort::by_last_update()
    } else {
        Sort::from_document(sort, "sort")?
    };

    let found = ctx.store().find_one(&conditions, &sort)?;

    tracing::info!(
        service = ctx.service_name(),
        action = ACTION,
        _id = %describe_id(found.as_ref()),
        "sorted document lookup"
    );

    Ok(found)
}
