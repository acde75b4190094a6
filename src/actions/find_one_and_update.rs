//! `find-one-and-update`: upsert one document, announce it, and return the
//! stored copy as `find-one` would see it.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as Json};

use super::{describe_id, find_one::find_one, to_response};
use crate::events::ChangeEvent;
use crate::microsvc::{ActionError, Context};
use crate::normalize::normalize_identifiers;
use crate::store::{DocumentStore, UpsertOptions};
use crate::validator::Schema;
use crate::value::{document_to_json, Document};

pub const ACTION: &str = "find-one-and-update";

/// Options as the caller sent them.
///
/// `upsert` and `setDefaultsOnInsert` are accepted for compatibility but
/// always forced on; see [`UpsertOptionsInput::effective`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpsertOptionsInput {
    pub upsert: Option<bool>,
    pub set_defaults_on_insert: Option<bool>,
    pub new: Option<bool>,
}

impl UpsertOptionsInput {
    /// The options handed to the store.
    pub fn effective(&self) -> UpsertOptions {
        UpsertOptions {
            upsert: true,
            set_defaults_on_insert: true,
            new: self.new.unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Params {
    conditions: Document,
    update: Document,
    #[serde(default)]
    options: UpsertOptionsInput,
}

pub fn params() -> Schema {
    Schema::object()
        .key("conditions", Schema::object().required())
        .key("update", Schema::object().required())
        .key(
            "options",
            Schema::object()
                .key("upsert", Schema::boolean())
                .key("setDefaultsOnInsert", Schema::boolean())
                .key("new", Schema::boolean())
                .unknown(false),
        )
        .unknown(false)
}

pub fn handle<S: DocumentStore>(ctx: &Context<'_, S>) -> Result<Json, ActionError> {
    let Params {
        conditions,
        update,
        options,
    } = ctx.params()?;
    let stored = find_one_and_update(ctx, &conditions, &update, &options)?;
    Ok(to_response(Some(&stored)))
}

/// Upsert the document matching `conditions`, emit `<service>.update` with
/// the stored document, then re-read it by its native `_id`.
pub fn find_one_and_update<S: DocumentStore>(
    ctx: &Context<'_, S>,
    conditions: &Document,
    update: &Document,
    options: &UpsertOptionsInput,
) -> Result<Document, ActionError> {
    let conditions = normalize_identifiers(conditions)?;
    let effective = options.effective();

    let stored = ctx
        .store()
        .find_one_and_update(&conditions, update, &effective)?;

    let (stored, id) = match stored {
        Some(doc) => match doc.get("_id").filter(|id| !id.is_null()).cloned() {
            Some(id) => (doc, id),
            None => {
                return Err(implementation_error(
                    "upsert returned a document without an _id",
                    &conditions,
                    update,
                    &effective,
                ))
            }
        },
        None => {
            return Err(implementation_error(
                "upsert returned no document",
                &conditions,
                update,
                &effective,
            ))
        }
    };

    tracing::info!(
        service = ctx.service_name(),
        action = ACTION,
        _id = %describe_id(Some(&stored)),
        "document upserted"
    );

    ctx.outbox().emit(ChangeEvent::update(ctx.service_name(), stored));

    // The write has committed and its event is out; nothing past this point
    // is the caller's fault.
    let by_id = Document::from_iter([("_id".to_string(), id)]);
    match find_one(ctx, &by_id) {
        Ok(Some(doc)) => Ok(doc),
        Ok(None) => Err(implementation_error(
            "upserted document not found on re-read",
            &conditions,
            update,
            &effective,
        )),
        Err(err) => Err(implementation_error(
            &format!("re-read of upserted document failed: {err}"),
            &conditions,
            update,
            &effective,
        )),
    }
}

fn implementation_error(
    message: &str,
    conditions: &Document,
    update: &Document,
    options: &UpsertOptions,
) -> ActionError {
    let data = json!({
        "conditions": document_to_json(conditions),
        "update": document_to_json(update),
        "options": options,
    });
    tracing::error!(action = ACTION, data = %data, "{}", message);
    ActionError::Implementation {
        message: message.to_string(),
        data,
    }
}
