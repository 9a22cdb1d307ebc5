use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::fs;
use tracing::debug;

use crate::dao::storage::{StorageError, StorageResult};

use super::{DocumentKey, DocumentStore};

/// Stores each document as `<data_dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    root: Arc<Path>,
}

impl FileDocumentStore {
    /// Create a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::from(root.into()),
        }
    }

    fn path_for(&self, key: DocumentKey) -> PathBuf {
        self.root.join(format!("{}.json", key.as_str()))
    }
}

impl DocumentStore for FileDocumentStore {
    fn load(&self, key: DocumentKey) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let path = self.path_for(key);
        Box::pin(async move {
            let contents = match fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
                Err(err) => {
                    return Err(StorageError::unavailable(
                        format!("failed to read {}", path.display()),
                        err,
                    ));
                }
            };
            serde_json::from_str(&contents)
                .map(Some)
                .map_err(|source| StorageError::malformed(key.as_str(), source))
        })
    }

    fn save(&self, key: DocumentKey, document: Value) -> BoxFuture<'static, StorageResult<()>> {
        let root = self.root.clone();
        let path = self.path_for(key);
        Box::pin(async move {
            let payload = serde_json::to_vec_pretty(&document)
                .map_err(|source| StorageError::malformed(key.as_str(), source))?;
            write_atomically(&root, &path, payload).await.map_err(|err| {
                StorageError::unavailable(format!("failed to write {}", path.display()), err)
            })?;
            debug!(path = %path.display(), "document written");
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let root = self.root.clone();
        Box::pin(async move {
            fs::create_dir_all(&root).await.map_err(|err| {
                StorageError::unavailable(format!("data directory {}", root.display()), err)
            })
        })
    }

    fn describe(&self) -> &'static str {
        "file"
    }
}

/// Write through a sibling temp file so readers never see a torn document.
async fn write_atomically(root: &Path, path: &Path, payload: Vec<u8>) -> io::Result<()> {
    fs::create_dir_all(root).await?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, payload).await?;
    fs::rename(&tmp, path).await
}
