//! Document storage abstraction for StartupMate.
//!
//! Storage engines implement [`DocumentBackend`], an untyped
//! "collection of JSON documents" interface: append a document to a named
//! collection, list the most recent documents of a collection.
//!
//! Application code goes through [`Store<T>`] instead, a typed handle bound
//! to the collection of one [`Document`] kind. It only accepts
//! [`Validated<T>`] values for insertion and decodes listed documents back
//! into `T`, wrapped in [`Stored<T>`] with the backend identifier
//! normalized to a plain string.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{Document, Validated};

/// Identifier assigned by the backend at insert time.
pub type DocumentId = String;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend is unreachable, uninitialized, or did not answer in time.
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    /// A persisted document no longer matches the shape of its kind.
    #[error("document {id} in '{collection}' could not be decoded: {reason}")]
    Decode {
        collection: String,
        id: DocumentId,
        reason: String,
    },
}

/// A persisted document as returned by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub id: DocumentId,
    pub fields: Map<String, Value>,
}

/// Abstract storage engine.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert`](DocumentBackend::insert) | Append a document, returning its new ID |
/// | [`list`](DocumentBackend::list) | Most recent documents of a collection, newest first |
/// | [`collection_names`](DocumentBackend::collection_names) | Collections holding at least one document |
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    async fn insert(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
    ) -> Result<DocumentId, StoreError>;

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<RawDocument>, StoreError>;

    async fn collection_names(&self) -> Result<Vec<String>, StoreError>;
}

/// A listed document with its identifier, serialized as the document's own
/// fields plus `_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stored<T> {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub document: T,
}

/// Typed handle onto the collection of one document kind.
pub struct Store<T> {
    backend: Arc<dyn DocumentBackend>,
    kind: PhantomData<fn() -> T>,
}

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            kind: PhantomData,
        }
    }
}

impl<T: Document> Store<T> {
    pub fn new(backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            backend,
            kind: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        T::schema().collection
    }

    /// Persists a validated document and returns its new identifier.
    pub async fn insert(&self, doc: &Validated<T>) -> Result<DocumentId, StoreError> {
        self.backend.insert(self.collection(), doc.fields()).await
    }

    /// Returns up to `limit` documents, newest first.
    pub async fn list(&self, limit: usize) -> Result<Vec<Stored<T>>, StoreError> {
        let collection = self.collection();
        self.backend
            .list(collection, limit)
            .await?
            .into_iter()
            .map(|raw| -> Result<Stored<T>, StoreError> {
                let document = serde_json::from_value(Value::Object(raw.fields)).map_err(|e| {
                    StoreError::Decode {
                        collection: collection.to_string(),
                        id: raw.id.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Stored {
                    id: raw.id,
                    document,
                })
            })
            .collect()
    }
}
