use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::storage::StorageResult;

use super::{DocumentKey, DocumentStore};

/// Volatile store for tests and throwaway sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<DashMap<DocumentKey, Value>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a document synchronously.
    pub fn get(&self, key: DocumentKey) -> Option<Value> {
        self.documents.get(&key).map(|entry| entry.value().clone())
    }

    /// Seed a document synchronously.
    pub fn insert(&self, key: DocumentKey, document: Value) {
        self.documents.insert(key, document);
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, key: DocumentKey) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let document = self.get(key);
        Box::pin(async move { Ok(document) })
    }

    fn save(&self, key: DocumentKey, document: Value) -> BoxFuture<'static, StorageResult<()>> {
        self.insert(key, document);
        Box::pin(async { Ok(()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn describe(&self) -> &'static str {
        "memory"
    }
}
