use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("invalid document path: {0}")]
    InvalidPath(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Field map of a document.
pub type Fields = serde_json::Map<String, Value>;

//
// ─── PATHS ─────────────────────────────────────────────────────────────────────
//

/// Location of a document: a collection path (odd number of segments) plus a
/// document id, e.g. `chapters/about me/sub_chapters` + `personal-info`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    collection: String,
    id: String,
}

impl DocumentPath {
    /// Build a path from its segments, e.g. `["vocabularies", "w1"]`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` if there is an odd number of
    /// segments, no segments, or a blank segment.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<String> = segments
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .collect();
        let joined = segments.join("/");
        if segments.is_empty()
            || segments.len() % 2 != 0
            || segments.iter().any(|s| s.trim().is_empty() || s.contains('/'))
        {
            return Err(StorageError::InvalidPath(joined));
        }
        let id = segments[segments.len() - 1].clone();
        let collection = segments[..segments.len() - 1].join("/");
        Ok(Self { collection, id })
    }

    /// Parse a slash-separated path.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` for malformed paths.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        Self::from_segments(raw.split('/'))
    }

    /// Path of document `id` inside `collection`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidPath` for malformed input.
    pub fn in_collection(collection: &str, id: &str) -> Result<Self, StorageError> {
        Self::from_segments(collection.split('/').chain(std::iter::once(id)))
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl fmt::Debug for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentPath({self})")
    }
}

/// A document returned by a collection query.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Merge `patch` into `target`. Nested objects merge key by key; every
/// other value replaces what was there.
pub fn merge_fields(target: &mut Fields, patch: Fields) {
    for (key, value) in patch {
        if let Value::Object(incoming) = value {
            if let Some(Value::Object(existing)) = target.get_mut(&key) {
                merge_fields(existing, incoming);
                continue;
            }
            target.insert(key, Value::Object(incoming));
        } else {
            target.insert(key, value);
        }
    }
}

//
// ─── CONTRACT ──────────────────────────────────────────────────────────────────
//

/// Persistent document store used for content and learner progress.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read. A missing
    /// document is `Ok(None)`.
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Fields>, StorageError>;

    /// Write a document. With `merge`, fields are merged into the existing
    /// document (see [`merge_fields`]); otherwise the document is replaced.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write is not durable.
    async fn set_document(
        &self,
        path: &DocumentPath,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StorageError>;

    /// Fetch the documents of `collection` whose ids are in `ids`.
    ///
    /// Missing ids are skipped; results follow the order of `ids`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn query_by_id_set(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Document>, StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

/// Simple in-memory store for tests and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<Mutex<BTreeMap<DocumentPath, Fields>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.lock().map_or(0, |g| g.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Fields>, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(path).cloned())
    }

    async fn set_document(
        &self,
        path: &DocumentPath,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        match guard.get_mut(path) {
            Some(existing) if merge => merge_fields(existing, fields),
            _ => {
                guard.insert(path.clone(), fields);
            }
        }
        Ok(())
    }

    async fn query_by_id_set(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Document>, StorageError> {
        let guard = self
            .documents
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            let path = DocumentPath::in_collection(collection, id)?;
            if let Some(fields) = guard.get(&path) {
                found.push(Document {
                    id: id.clone(),
                    fields: fields.clone(),
                });
            }
        }
        Ok(found)
    }
}

/// Aggregates the document store behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub documents: Arc<dyn DocumentStore>,
}
