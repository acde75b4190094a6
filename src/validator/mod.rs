//! Parameter validation for actions.
//!
//! The host compiles each action's declared [`ParamSchema`] once, at
//! registration, into a [`Check`] that runs before every call to that
//! action's handler. Anything that is not a recognised [`Schema`] is treated
//! as "no constraint declared" and always passes.

mod schema;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

pub use schema::Schema;

/// One violation found while validating parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDetail {
    /// Human-readable message, e.g. `"conditions" is required`.
    pub message: String,
    /// Path from the root of the params to the offending field.
    pub path: Vec<String>,
    /// Machine-readable violation tag, e.g. `any.required`.
    #[serde(rename = "type")]
    pub kind: String,
}

impl ValidationDetail {
    pub(crate) fn new(path: &[String], kind: &str, problem: &str) -> Self {
        let label = if path.is_empty() {
            "value".to_string()
        } else {
            path.join(".")
        };
        Self {
            message: format!("\"{}\" {}", label, problem),
            path: path.to_vec(),
            kind: kind.to_string(),
        }
    }
}

/// Parameters did not satisfy the action's declared schema.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Always `ValidationError`; lets observability tooling tell this apart
    /// from storage and identifier failures.
    pub kind: String,
    pub details: Vec<ValidationDetail>,
}

impl ValidationError {
    pub const KIND: &'static str = "ValidationError";

    pub fn new(details: Vec<ValidationDetail>) -> Self {
        let message = details
            .iter()
            .map(|d| d.message.as_str())
            .collect::<Vec<_>>()
            .join(". ");
        Self {
            message,
            kind: Self::KIND.to_string(),
            details,
        }
    }

    /// A single violation at `path`.
    pub fn at(path: &[&str], kind: &str, problem: &str) -> Self {
        let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        Self::new(vec![ValidationDetail::new(&path, kind, problem)])
    }
}

/// What an action declares about its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSchema {
    /// A schema this validator understands.
    Schema(Schema),
    /// Anything else. Never constrains the params.
    Any(Json),
}

impl From<Schema> for ParamSchema {
    fn from(schema: Schema) -> Self {
        ParamSchema::Schema(schema)
    }
}

/// A compiled parameter check.
pub type Check = Box<dyn Fn(&Json) -> Result<bool, ValidationError> + Send + Sync>;

/// Compiles declared schemas into parameter checks.
pub trait Validator: Send + Sync {
    fn compile(&self, schema: &ParamSchema) -> Check;
}

/// The default validator: checks params against a [`Schema`] and logs every
/// failure with its full detail before returning it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `params` against `schema` directly.
    pub fn validate(&self, params: &Json, schema: &ParamSchema) -> Result<bool, ValidationError> {
        let ParamSchema::Schema(schema) = schema else {
            return Ok(true);
        };

        match schema.validate(params) {
            Ok(()) => Ok(true),
            Err(details) => {
                let err = ValidationError::new(details);
                tracing::error!(
                    error = %err.message,
                    kind = %err.kind,
                    details = ?err.details,
                    "parameter validation failed"
                );
                Err(err)
            }
        }
    }
}

impl Validator for SchemaValidator {
    fn compile(&self, schema: &ParamSchema) -> Check {
        let validator = *self;
        let schema = schema.clone();
        Box::new(move |params: &Json| validator.validate(params, &schema))
    }
}
