//! Update-document application.
//!
//! Supports `$set`, `$unset`, `$inc`, `$push` and `$setOnInsert`. Top-level
//! keys that are not operators are treated as `$set`, so `{ "price": 10 }`
//! and `{ "$set": { "price": 10 } }` mean the same thing.

use crate::value::{get_path, remove_path, set_path, Document, Value};

use super::StoreError;

const ID: &str = "_id";

/// Apply `update` to `doc` in place. `inserting` enables `$setOnInsert`
/// and allows `_id` to be assigned.
pub(super) fn apply_update(
    doc: &mut Document,
    update: &Document,
    inserting: bool,
) -> Result<(), StoreError> {
    let mut implicit_set = Document::new();

    for (key, value) in update {
        if !key.starts_with('$') {
            implicit_set.insert(key.clone(), value.clone());
            continue;
        }

        let fields = value.as_document().ok_or_else(|| {
            StoreError::InvalidUpdate(format!(
                "{} expects a document, got {}",
                key,
                value.type_name()
            ))
        })?;

        match key.as_str() {
            "$set" => set_fields(doc, fields, inserting)?,
            "$setOnInsert" => {
                if inserting {
                    set_fields(doc, fields, inserting)?;
                }
            }
            "$unset" => {
                for path in fields.keys() {
                    guard_id(doc, path, None, inserting)?;
                    remove_path(doc, path);
                }
            }
            "$inc" => {
                for (path, amount) in fields {
                    increment(doc, path, amount)?;
                }
            }
            "$push" => {
                for (path, item) in fields {
                    push(doc, path, item)?;
                }
            }
            other => {
                return Err(StoreError::InvalidUpdate(format!(
                    "unknown update operator {}",
                    other
                )))
            }
        }
    }

    set_fields(doc, &implicit_set, inserting)
}

fn set_fields(doc: &mut Document, fields: &Document, inserting: bool) -> Result<(), StoreError> {
    for (path, value) in fields {
        guard_id(doc, path, Some(value), inserting)?;
        set_path(doc, path, value.clone());
    }
    Ok(())
}

/// `_id` can be written while inserting, or re-set to the value it already
/// has. Anything else is a change of identity.
fn guard_id(
    doc: &Document,
    path: &str,
    value: Option<&Value>,
    inserting: bool,
) -> Result<(), StoreError> {
    if path != ID && !path.starts_with("_id.") {
        return Ok(());
    }
    if inserting {
        return Ok(());
    }
    match (get_path(doc, path), value) {
        (Some(current), Some(new)) if current.loosely_equals(new) => Ok(()),
        _ => Err(StoreError::ImmutableField(path.to_string())),
    }
}

fn increment(doc: &mut Document, path: &str, amount: &Value) -> Result<(), StoreError> {
    let Value::Number(delta) = amount else {
        return Err(StoreError::InvalidUpdate(format!(
            "$inc on {} expects a number, got {}",
            path,
            amount.type_name()
        )));
    };

    let next = match get_path(doc, path) {
        None | Some(Value::Null) => Value::Number(delta.clone()),
        Some(Value::Number(current)) => match (current.as_i64(), delta.as_i64()) {
            (Some(a), Some(b)) => match a.checked_add(b) {
                Some(sum) => Value::from(sum),
                None => Value::from(a as f64 + b as f64),
            },
            _ => Value::from(current.as_f64().unwrap_or(0.0) + delta.as_f64().unwrap_or(0.0)),
        },
        Some(other) => {
            return Err(StoreError::InvalidUpdate(format!(
                "cannot apply $inc to {} of type {}",
                path,
                other.type_name()
            )))
        }
    };

    set_path(doc, path, next);
    Ok(())
}

fn push(doc: &mut Document, path: &str, item: &Value) -> Result<(), StoreError> {
    let next = match get_path(doc, path) {
        None => Value::Array(vec![item.clone()]),
        Some(Value::Array(items)) => {
            let mut items = items.clone();
            items.push(item.clone());
            Value::Array(items)
        }
        Some(other) => {
            return Err(StoreError::InvalidUpdate(format!(
                "cannot apply $push to {} of type {}",
                path,
                other.type_name()
            )))
        }
    };

    set_path(doc, path, next);
    Ok(())
}
