//! In-memory [`DocumentBackend`] for tests and embedding.
//!
//! Collections are `Vec`s in insertion order behind a `std::sync::RwLock`.
//! The backend can be switched offline to exercise `Unavailable` paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{DocumentBackend, DocumentId, RawDocument, StoreError};

/// In-memory document store.
pub struct InMemoryBackend {
    collections: RwLock<HashMap<String, Vec<RawDocument>>>,
    online: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
        }
    }

    /// Makes every subsequent call fail with [`StoreError::Unavailable`]
    /// (`false`) or succeed again (`true`).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable(
                "in-memory store is offline".to_string(),
            ))
        }
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl DocumentBackend for InMemoryBackend {
    async fn insert(
        &self,
        collection: &str,
        fields: &Map<String, Value>,
    ) -> Result<DocumentId, StoreError> {
        self.ensure_online()?;
        let id = Uuid::new_v4().to_string();
        let mut collections = self.collections.write().map_err(poisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(RawDocument {
                id: id.clone(),
                fields: fields.clone(),
            });
        Ok(id)
    }

    async fn list(&self, collection: &str, limit: usize) -> Result<Vec<RawDocument>, StoreError> {
        self.ensure_online()?;
        let collections = self.collections.read().map_err(poisoned)?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn collection_names(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_online()?;
        let collections = self.collections.read().map_err(poisoned)?;
        let mut names: Vec<String> = collections
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }
}
