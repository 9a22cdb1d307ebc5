#[cfg(feature = "couch-store")]
pub mod couchdb;
mod fallback;
mod file;
mod memory;

use std::fmt;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::storage::StorageResult;

pub use fallback::FallbackDocumentStore;
pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;

/// Logical names of the documents the coordinator persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKey {
    /// Ordered list of registered players.
    Users,
    /// Catalog of named boards.
    Boards,
    /// Pointer to the live board.
    ActiveGame,
}

impl DocumentKey {
    /// Every key, in seeding order.
    pub const ALL: [DocumentKey; 3] = [
        DocumentKey::Users,
        DocumentKey::Boards,
        DocumentKey::ActiveGame,
    ];

    /// Stable name used as file stem or document id.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKey::Users => "users",
            DocumentKey::Boards => "boards",
            DocumentKey::ActiveGame => "active_game",
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Abstraction over the key-value document backend used to seed and
/// checkpoint the session.
pub trait DocumentStore: Send + Sync {
    /// Fetch a document, `None` when it was never written.
    fn load(&self, key: DocumentKey) -> BoxFuture<'static, StorageResult<Option<Value>>>;
    /// Replace a document wholesale.
    fn save(&self, key: DocumentKey, document: Value) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap reachability probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Short backend name for logs.
    fn describe(&self) -> &'static str;
}
