//! Document stores - find and upsert over plain documents.
//!
//! The actions only need two primitives from storage: find one document by
//! equality conditions under a sort, and an atomic find-and-modify with
//! upsert. Reads are always "lean": the store hands back plain [`Document`]
//! values, never live handles.
//!
//! ## Example
//!
//! ```ignore
//! use docstore_actions::store::{DocumentStore, InMemoryDocumentStore, Sort, UpsertOptions};
//!
//! let store = InMemoryDocumentStore::new("products");
//! let doc = store.find_one_and_update(&conditions, &update, &UpsertOptions::default())?;
//! let again = store.find_one(&conditions, &Sort::by_recency())?;
//! ```

mod in_memory;
mod update;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::validator::ValidationError;
use crate::value::{Document, Value};

pub use in_memory::InMemoryDocumentStore;

/// Field stamped when a document is first inserted.
pub const CREATED_AT: &str = "createdAt";
/// Field stamped on every write.
pub const UPDATED_AT: &str = "updatedAt";

/// Error type for document store operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("document store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    #[error("unsupported operator {0} (only equality conditions are supported)")]
    UnsupportedOperator(String),
    #[error("invalid update: {0}")]
    InvalidUpdate(String),
    #[error("field {0} is immutable")]
    ImmutableField(String),
    #[error("_id of a new document must be an ObjectId, got {0}")]
    InvalidIdentifier(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Whether the request itself was at fault: retrying it unchanged
    /// fails the same way.
    pub fn is_client_fault(&self) -> bool {
        matches!(
            self,
            StoreError::UnsupportedOperator(_)
                | StoreError::InvalidUpdate(_)
                | StoreError::ImmutableField(_)
                | StoreError::InvalidIdentifier(_)
        )
    }
}

/// Sort direction for a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Parse `1`, `-1`, `"asc"`, `"ascending"`, `"desc"` or `"descending"`.
    pub fn parse(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_f64() {
                Some(x) if x == 1.0 => Some(SortDirection::Ascending),
                Some(x) if x == -1.0 => Some(SortDirection::Descending),
                _ => None,
            },
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "asc" | "ascending" => Some(SortDirection::Ascending),
                "desc" | "descending" => Some(SortDirection::Descending),
                _ => None,
            },
            _ => None,
        }
    }
}

/// An ordered list of sort keys; earlier keys take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort(Vec<(String, SortDirection)>);

impl Sort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently updated first, ties broken by most recently created.
    pub fn by_recency() -> Self {
        Self::new().descending(UPDATED_AT).descending(CREATED_AT)
    }

    /// Most recently updated first, with no tie-break.
    pub fn by_last_update() -> Self {
        Self::new().descending(UPDATED_AT)
    }

    pub fn ascending(mut self, field: &str) -> Self {
        self.0.push((field.to_string(), SortDirection::Ascending));
        self
    }

    pub fn descending(mut self, field: &str) -> Self {
        self.0.push((field.to_string(), SortDirection::Descending));
        self
    }

    /// Build a sort from a caller-supplied `field -> direction` map, keeping
    /// key order. `field_prefix` is where the map sits in the params, for
    /// error paths.
    pub fn from_document(directions: &Document, field_prefix: &str) -> Result<Self, ValidationError> {
        let mut keys = Vec::with_capacity(directions.len());
        for (field, direction) in directions {
            let direction = SortDirection::parse(direction).ok_or_else(|| {
                ValidationError::at(
                    &[field_prefix, field.as_str()],
                    "sort.direction",
                    "must be one of 1, -1, asc, ascending, desc, descending",
                )
            })?;
            keys.push((field.clone(), direction));
        }
        Ok(Self(keys))
    }

    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Effective options for an upsert as seen by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOptions {
    /// Insert when nothing matches.
    pub upsert: bool,
    /// Apply the store's configured defaults to inserted documents.
    pub set_defaults_on_insert: bool,
    /// Return the document after the update rather than before it.
    pub new: bool,
}

impl Default for UpsertOptions {
    fn default() -> Self {
        Self {
            upsert: true,
            set_defaults_on_insert: true,
            new: true,
        }
    }
}

/// Storage backend for the document actions.
pub trait DocumentStore: Send + Sync {
    /// Find the first document matching every equality condition, in `sort`
    /// order. Returns `None` when nothing matches.
    fn find_one(&self, conditions: &Document, sort: &Sort) -> Result<Option<Document>, StoreError>;

    /// Atomically find one matching document and apply `update` to it,
    /// inserting a new document when nothing matches and `options.upsert` is
    /// set. Returns the post-update document when `options.new`, else the
    /// pre-update one (`None` after an insert).
    fn find_one_and_update(
        &self,
        conditions: &Document,
        update: &Document,
        options: &UpsertOptions,
    ) -> Result<Option<Document>, StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    fn find_one(&self, conditions: &Document, sort: &Sort) -> Result<Option<Document>, StoreError> {
        (**self).find_one(conditions, sort)
    }

    fn find_one_and_update(
        &self,
        conditions: &Document,
        update: &Document,
        options: &UpsertOptions,
    ) -> Result<Option<Document>, StoreError> {
        (**self).find_one_and_update(conditions, update, options)
    }
}
