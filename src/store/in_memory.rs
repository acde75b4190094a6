//! InMemoryDocumentStore - Vec-backed document store for testing and development.

use std::cmp::Ordering;
use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::value::{get_path, set_path, Document, ObjectId, Value};

use super::update::apply_update;
use super::{DocumentStore, Sort, SortDirection, StoreError, UpsertOptions, CREATED_AT, UPDATED_AT};

/// In-memory document store for a single collection.
///
/// Clone-friendly via Arc: clones share the same documents. Every
/// find-and-modify runs under one write lock, so concurrent upserts on the
/// same conditions never produce duplicates.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    collection: String,
    documents: Arc<RwLock<Vec<Document>>>,
    defaults: Document,
    timestamps: bool,
}

impl InMemoryDocumentStore {
    /// Create an empty store with timestamps enabled and no defaults.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            documents: Arc::new(RwLock::new(Vec::new())),
            defaults: Document::new(),
            timestamps: true,
        }
    }

    /// Field defaults applied to inserted documents when the upsert asks for
    /// `setDefaultsOnInsert`. Keys may be dotted paths.
    pub fn with_defaults(mut self, defaults: Document) -> Self {
        self.defaults = defaults;
        self
    }

    /// Stop stamping `createdAt` / `updatedAt`.
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Insert a document as-is, assigning an `_id` if it has none. Returns
    /// the stored document.
    pub fn insert(&self, mut doc: Document) -> Result<Document, StoreError> {
        assign_id(&mut doc)?;
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::LockPoisoned("insert"))?;
        documents.push(doc.clone());
        Ok(doc)
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every stored document in insertion order.
    pub fn documents(&self) -> Result<Vec<Document>, StoreError> {
        self.documents
            .read()
            .map(|d| d.clone())
            .map_err(|_| StoreError::LockPoisoned("documents"))
    }

    fn build_insert(&self, conditions: &Document, update: &Document, options: &UpsertOptions) -> Result<Document, StoreError> {
        let mut doc = Document::new();
        for (path, value) in conditions {
            set_path(&mut doc, path, value.clone());
        }

        apply_update(&mut doc, update, true)?;

        assign_id(&mut doc)?;

        if options.set_defaults_on_insert {
            for (path, value) in &self.defaults {
                if get_path(&doc, path).is_none() {
                    set_path(&mut doc, path, value.clone());
                }
            }
        }

        if self.timestamps {
            let now = Value::from(Utc::now());
            doc.insert(CREATED_AT.to_string(), now.clone());
            doc.insert(UPDATED_AT.to_string(), now);
        }

        Ok(doc)
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn find_one(&self, conditions: &Document, sort: &Sort) -> Result<Option<Document>, StoreError> {
        check_conditions(conditions)?;
        let documents = self
            .documents
            .read()
            .map_err(|_| StoreError::LockPoisoned("find_one"))?;

        let best = documents
            .iter()
            .filter(|doc| matches(doc, conditions))
            .reduce(|best, candidate| {
                // Keep the earlier document on ties.
                if compare(candidate, best, sort) == Ordering::Less {
                    candidate
                } else {
                    best
                }
            });

        Ok(best.cloned())
    }

    fn find_one_and_update(
        &self,
        conditions: &Document,
        update: &Document,
        options: &UpsertOptions,
    ) -> Result<Option<Document>, StoreError> {
        check_conditions(conditions)?;
        let mut documents = self
            .documents
            .write()
            .map_err(|_| StoreError::LockPoisoned("find_one_and_update"))?;

        if let Some(index) = documents.iter().position(|doc| matches(doc, conditions)) {
            let before = documents[index].clone();
            let mut after = before.clone();
            apply_update(&mut after, update, false)?;
            if self.timestamps {
                after.insert(UPDATED_AT.to_string(), Value::from(Utc::now()));
            }
            documents[index] = after.clone();

            tracing::debug!(collection = %self.collection, "updated document");
            return Ok(Some(if options.new { after } else { before }));
        }

        if !options.upsert {
            return Ok(None);
        }

        let doc = self.build_insert(conditions, update, options)?;
        documents.push(doc.clone());

        tracing::debug!(collection = %self.collection, "inserted document");
        Ok(options.new.then_some(doc))
    }
}

/// New documents get a fresh `_id` unless they already carry an ObjectId.
fn assign_id(doc: &mut Document) -> Result<(), StoreError> {
    match doc.get("_id") {
        None => {
            doc.shift_insert(0, "_id".to_string(), ObjectId::new().into());
            Ok(())
        }
        Some(Value::ObjectId(_)) => Ok(()),
        Some(other) => Err(StoreError::InvalidIdentifier(
            serde_json::Value::from(other.clone()).to_string(),
        )),
    }
}

fn check_conditions(conditions: &Document) -> Result<(), StoreError> {
    match conditions.keys().find(|k| k.starts_with('$')) {
        Some(op) => Err(StoreError::UnsupportedOperator(op.clone())),
        None => Ok(()),
    }
}

fn matches(doc: &Document, conditions: &Document) -> bool {
    conditions.iter().all(|(path, expected)| match get_path(doc, path) {
        None => expected.is_null(),
        Some(Value::Array(items)) if !matches!(expected, Value::Array(_)) => {
            items.iter().any(|item| item.loosely_equals(expected))
        }
        Some(actual) => actual.loosely_equals(expected),
    })
}

/// Missing sort fields order as null.
static NULL: Value = Value::Null;

fn compare(a: &Document, b: &Document, sort: &Sort) -> Ordering {
    for (field, direction) in sort.keys() {
        let left = get_path(a, field).unwrap_or(&NULL);
        let right = get_path(b, field).unwrap_or(&NULL);
        let ord = match direction {
            SortDirection::Ascending => left.sort_cmp(right),
            SortDirection::Descending => right.sort_cmp(left),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
