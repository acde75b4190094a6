//! Dotted-path access into nested documents.

use super::{Document, Value};

/// Look up a dotted path. Numeric segments index into arrays.
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = doc.get(first)?;

    for segment in segments {
        current = match current {
            Value::Document(inner) => inner.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Set a dotted path, creating intermediate documents as needed. A
/// non-document value in the way is replaced.
pub fn set_path(doc: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            doc.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = doc
                .entry(head.to_string())
                .or_insert_with(|| Value::Document(Document::new()));
            if !matches!(entry, Value::Document(_)) {
                *entry = Value::Document(Document::new());
            }
            if let Value::Document(inner) = entry {
                set_path(inner, rest, value);
            }
        }
    }
}

/// Remove a dotted path, returning the removed value.
pub fn remove_path(doc: &mut Document, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => doc.shift_remove(path),
        Some((head, rest)) => match doc.get_mut(head)? {
            Value::Document(inner) => remove_path(inner, rest),
            _ => None,
        },
    }
}
