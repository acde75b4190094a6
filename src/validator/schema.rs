//! Declarative parameter schemas.
//!
//! A small object-schema language covering what action parameter contracts
//! need: typed keys, required/optional markers, and a switch deciding whether
//! undeclared keys are allowed.
//!
//! ```ignore
//! let schema = Schema::object()
//!     .key("conditions", Schema::object().unknown(true).required())
//!     .key("sort", Schema::object().unknown(true))
//!     .unknown(false);
//! ```

use indexmap::IndexMap;
use serde_json::Value as Json;

use super::ValidationDetail;

#[derive(Debug, Clone, PartialEq)]
enum SchemaKind {
    Any,
    Boolean,
    Object {
        keys: IndexMap<String, Schema>,
        allow_unknown: bool,
    },
}

/// A parameter schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    kind: SchemaKind,
    required: bool,
}

impl Schema {
    /// Accepts any value.
    pub fn any() -> Self {
        Self::with_kind(SchemaKind::Any)
    }

    /// Accepts `true` or `false`.
    pub fn boolean() -> Self {
        Self::with_kind(SchemaKind::Boolean)
    }

    /// Accepts a JSON object. Undeclared keys are allowed until
    /// `unknown(false)` is set.
    pub fn object() -> Self {
        Self::with_kind(SchemaKind::Object {
            keys: IndexMap::new(),
            allow_unknown: true,
        })
    }

    fn with_kind(kind: SchemaKind) -> Self {
        Self {
            kind,
            required: false,
        }
    }

    /// Declare a key on an object schema. Ignored on non-object schemas.
    pub fn key(mut self, name: &str, schema: Schema) -> Self {
        if let SchemaKind::Object { keys, .. } = &mut self.kind {
            keys.insert(name.to_string(), schema);
        }
        self
    }

    /// Allow or forbid keys that were not declared.
    pub fn unknown(mut self, allow: bool) -> Self {
        if let SchemaKind::Object { allow_unknown, .. } = &mut self.kind {
            *allow_unknown = allow;
        }
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Validate a value, collecting every violation.
    pub fn validate(&self, value: &Json) -> Result<(), Vec<ValidationDetail>> {
        let mut details = Vec::new();
        self.check(value, &mut Vec::new(), &mut details);
        if details.is_empty() {
            Ok(())
        } else {
            Err(details)
        }
    }

    fn check(&self, value: &Json, path: &mut Vec<String>, details: &mut Vec<ValidationDetail>) {
        match &self.kind {
            SchemaKind::Any => {}
            SchemaKind::Boolean => {
                if !value.is_boolean() {
                    details.push(ValidationDetail::new(
                        path,
                        "boolean.base",
                        "must be a boolean",
                    ));
                }
            }
            SchemaKind::Object {
                keys,
                allow_unknown,
            } => {
                let Some(map) = value.as_object() else {
                    details.push(ValidationDetail::new(
                        path,
                        "object.base",
                        "must be of type object",
                    ));
                    return;
                };

                for (name, schema) in keys {
                    path.push(name.clone());
                    match map.get(name) {
                        Some(child) => schema.check(child, path, details),
                        None if schema.required => {
                            details.push(ValidationDetail::new(path, "any.required", "is required"))
                        }
                        None => {}
                    }
                    path.pop();
                }

                if !allow_unknown {
                    for name in map.keys().filter(|k| !keys.contains_key(*k)) {
                        path.push(name.clone());
                        details.push(ValidationDetail::new(
                            path,
                            "object.unknown",
                            "is not allowed",
                        ));
                        path.pop();
                    }
                }
            }
        }
    }
}
