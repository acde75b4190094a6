//! Identifier normalization for condition maps.
//!
//! Any key whose last dot-delimited segment is `_id` (`"_id"`,
//! `"owner._id"`) holds an identifier. Callers send identifiers as hex
//! strings; the store compares native [`ObjectId`] values, so conditions
//! are normalized before every query.

use crate::microsvc::ActionError;
use crate::value::{Document, ObjectId, Value};

/// Whether `key` names an identifier field.
pub fn is_identifier_key(key: &str) -> bool {
    key.rsplit('.').next() == Some("_id")
}

/// Return a copy of `conditions` with every identifier field converted to
/// an [`ObjectId`]. Keys and their order are preserved; other values pass
/// through untouched. Already-native identifiers are left as they are, so
/// normalizing twice is the same as normalizing once.
pub fn normalize_identifiers(conditions: &Document) -> Result<Document, ActionError> {
    conditions
        .iter()
        .map(|(key, value)| {
            if is_identifier_key(key) {
                Ok((key.clone(), Value::ObjectId(to_object_id(key, value)?)))
            } else {
                Ok((key.clone(), value.clone()))
            }
        })
        .collect()
}

fn to_object_id(key: &str, value: &Value) -> Result<ObjectId, ActionError> {
    match value {
        Value::ObjectId(id) => Ok(*id),
        Value::String(s) => ObjectId::parse_str(s).map_err(|e| malformed(key, value, e.to_string())),
        other => Err(malformed(
            key,
            value,
            format!("expected an identifier string, got {}", other.type_name()),
        )),
    }
}

fn malformed(key: &str, value: &Value, reason: String) -> ActionError {
    ActionError::MalformedIdentifier {
        key: key.to_string(),
        value: value.clone().into(),
        reason,
    }
}
