//! Error types for actions.

use serde_json::{json, Value as Json};
use thiserror::Error;

use crate::store::StoreError;
use crate::validator::ValidationError;

/// Error type for action dispatch and handlers.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Params did not satisfy the action's declared schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An identifier field could not be converted to an ObjectId.
    #[error("malformed identifier in {key}: {reason}")]
    MalformedIdentifier {
        key: String,
        value: Json,
        reason: String,
    },
    /// A collaborator broke its contract. A defect, never retried.
    #[error("{message}")]
    Implementation { message: String, data: Json },
    /// No action registered under this name.
    #[error("unknown action: {0}")]
    UnknownAction(String),
    /// Params passed the schema but could not be decoded.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// The document store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<serde_json::Error> for ActionError {
    fn from(err: serde_json::Error) -> Self {
        ActionError::DecodeFailed(err.to_string())
    }
}

impl ActionError {
    /// Stable tag naming the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::Validation(_) => ValidationError::KIND,
            ActionError::MalformedIdentifier { .. } => "MalformedIdentifier",
            ActionError::Implementation { .. } => "ImplementationError",
            ActionError::UnknownAction(_) => "UnknownAction",
            ActionError::DecodeFailed(_) => "DecodeFailed",
            ActionError::Store(_) => "StoreError",
        }
    }

    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ActionError::Validation(_) => 422,
            ActionError::MalformedIdentifier { .. } => 422,
            ActionError::Implementation { .. } => 500,
            ActionError::UnknownAction(_) => 404,
            ActionError::DecodeFailed(_) => 400,
            ActionError::Store(e) if e.is_client_fault() => 422,
            ActionError::Store(_) => 500,
        }
    }

    /// Whether the caller can fix this by changing its input.
    pub fn is_client_fault(&self) -> bool {
        self.status_code() < 500
    }

    /// Response body for transports: `{ error, kind, data? }`.
    pub fn to_body(&self) -> Json {
        let data = match self {
            ActionError::Validation(err) => Some(json!(err.details)),
            ActionError::MalformedIdentifier { key, value, .. } => {
                Some(json!({ "key": key, "value": value }))
            }
            ActionError::Implementation { data, .. } => Some(data.clone()),
            _ => None,
        };

        let mut body = json!({ "error": self.to_string(), "kind": self.kind() });
        if let (Some(data), Some(map)) = (data, body.as_object_mut()) {
            map.insert("data".to_string(), data);
        }
        body
    }
}
