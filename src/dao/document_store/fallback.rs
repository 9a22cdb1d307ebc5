use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::warn;

use crate::dao::storage::StorageResult;

use super::{DocumentKey, DocumentStore};

/// Uses `primary` and falls back to `secondary` whenever the primary fails.
///
/// Writes go to the primary first; on failure the document lands in the
/// secondary so a later restart can still read it back.
#[derive(Clone)]
pub struct FallbackDocumentStore {
    primary: Arc<dyn DocumentStore>,
    secondary: Arc<dyn DocumentStore>,
}

impl FallbackDocumentStore {
    /// Chain two stores.
    pub fn new(primary: Arc<dyn DocumentStore>, secondary: Arc<dyn DocumentStore>) -> Self {
        Self { primary, secondary }
    }
}

impl DocumentStore for FallbackDocumentStore {
    fn load(&self, key: DocumentKey) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let primary = self.primary.clone();
        let secondary = self.secondary.clone();
        Box::pin(async move {
            match primary.load(key).await {
                Ok(Some(document)) => Ok(Some(document)),
                Ok(None) => secondary.load(key).await,
                Err(err) => {
                    warn!(
                        %key,
                        backend = primary.describe(),
                        error = %err,
                        "primary load failed; using fallback store"
                    );
                    secondary.load(key).await
                }
            }
        })
    }

    fn save(&self, key: DocumentKey, document: Value) -> BoxFuture<'static, StorageResult<()>> {
        let primary = self.primary.clone();
        let secondary = self.secondary.clone();
        Box::pin(async move {
            match primary.save(key, document.clone()).await {
                Ok(()) => Ok(()),
                Err(err) => {
                    warn!(
                        %key,
                        backend = primary.describe(),
                        error = %err,
                        "primary save failed; using fallback store"
                    );
                    secondary.save(key, document).await
                }
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let primary = self.primary.clone();
        let secondary = self.secondary.clone();
        Box::pin(async move {
            match primary.health_check().await {
                Ok(()) => Ok(()),
                Err(_) => secondary.health_check().await,
            }
        })
    }

    fn describe(&self) -> &'static str {
        "fallback"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{document_store::MemoryDocumentStore, storage::StorageError};
    use serde_json::json;

    struct BrokenStore;

    fn broken() -> StorageError {
        StorageError::unavailable(
            "offline".into(),
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "offline"),
        )
    }

    impl DocumentStore for BrokenStore {
        fn load(&self, _key: DocumentKey) -> BoxFuture<'static, StorageResult<Option<Value>>> {
            Box::pin(async { Err(broken()) })
        }

        fn save(&self, _key: DocumentKey, _document: Value) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(broken()) })
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            Box::pin(async { Err(broken()) })
        }

        fn describe(&self) -> &'static str {
            "broken"
        }
    }

    #[tokio::test]
    async fn writes_land_in_secondary_when_primary_fails() {
        let local = MemoryDocumentStore::new();
        let store = FallbackDocumentStore::new(Arc::new(BrokenStore), Arc::new(local.clone()));

        store.save(DocumentKey::Users, json!([])).await.unwrap();

        assert_eq!(local.get(DocumentKey::Users), Some(json!([])));
        assert_eq!(store.load(DocumentKey::Users).await.unwrap(), Some(json!([])));
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn primary_wins_when_available() {
        let remote = MemoryDocumentStore::new();
        let local = MemoryDocumentStore::new();
        remote.insert(DocumentKey::Boards, json!({ "boards": {} }));
        local.insert(DocumentKey::Boards, json!({ "categories": [] }));
        let store = FallbackDocumentStore::new(Arc::new(remote.clone()), Arc::new(local.clone()));

        assert_eq!(
            store.load(DocumentKey::Boards).await.unwrap(),
            Some(json!({ "boards": {} }))
        );
        store.save(DocumentKey::Boards, json!({ "boards": { "a": {} } })).await.unwrap();
        assert_eq!(local.get(DocumentKey::Boards), Some(json!({ "categories": [] })));
    }
}
