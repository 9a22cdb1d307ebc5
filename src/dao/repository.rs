use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::dao::{
    document_store::{DocumentKey, DocumentStore},
    models::{ActiveGameEntity, BoardsDocument, PlayerEntity},
    storage::{StorageError, StorageResult},
};

/// Typed access to the documents held by a [`DocumentStore`].
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn DocumentStore>,
}

impl Repository {
    /// Wrap a store.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Registered players, `None` when the document was never written.
    pub async fn load_users(&self) -> StorageResult<Option<Vec<PlayerEntity>>> {
        self.load(DocumentKey::Users).await
    }

    /// Board catalog, `None` when the document was never written.
    pub async fn load_boards(&self) -> StorageResult<Option<BoardsDocument>> {
        self.load(DocumentKey::Boards).await
    }

    /// Live board pointer, `None` when no board was ever activated.
    pub async fn load_active_game(&self) -> StorageResult<Option<ActiveGameEntity>> {
        self.load(DocumentKey::ActiveGame).await
    }

    /// Encode and write a document.
    pub async fn save<T: Serialize>(&self, key: DocumentKey, document: &T) -> StorageResult<()> {
        let value = encode(key, document)?;
        self.store.save(key, value).await
    }

    async fn load<T: DeserializeOwned>(&self, key: DocumentKey) -> StorageResult<Option<T>> {
        match self.store.load(key).await? {
            Some(value) => decode(key, value).map(Some),
            None => Ok(None),
        }
    }
}

/// Serialize a typed document into the value handed to a store.
pub fn encode<T: Serialize>(key: DocumentKey, document: &T) -> StorageResult<Value> {
    serde_json::to_value(document).map_err(|source| StorageError::malformed(key.as_str(), source))
}

fn decode<T: DeserializeOwned>(key: DocumentKey, value: Value) -> StorageResult<T> {
    serde_json::from_value(value).map_err(|source| StorageError::malformed(key.as_str(), source))
}
