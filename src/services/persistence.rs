//! Ordered, best-effort checkpointing of the session to the document store.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::dao::{
    document_store::{DocumentKey, DocumentStore},
    repository::encode,
    storage::{StorageError, StorageResult},
};

enum PersistenceRequest {
    Save {
        key: DocumentKey,
        document: Value,
        ack: Option<oneshot::Sender<StorageResult<()>>>,
    },
    Flush(oneshot::Sender<()>),
}

/// Cheap handle used to enqueue writes onto the persistence worker.
///
/// Writes are applied one at a time in submission order, so a later snapshot
/// of a document can never be overwritten by an earlier one.
#[derive(Clone)]
pub struct PersistenceHandle {
    tx: mpsc::UnboundedSender<PersistenceRequest>,
}

impl PersistenceHandle {
    /// Spawn the worker task draining the queue into `store`.
    pub fn spawn(store: Arc<dyn DocumentStore>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(store, rx));
        (Self { tx }, worker)
    }

    /// Fire-and-forget save of a typed document.
    pub fn save<T: Serialize>(&self, key: DocumentKey, document: &T) {
        match encode(key, document) {
            Ok(value) => self.enqueue(key, value, None),
            Err(err) => warn!(%key, error = %err, "failed to encode document; not persisted"),
        }
    }

    /// Enqueue a save now and hand back a receipt for its outcome. The write
    /// keeps its place in the queue even if the receipt is awaited later.
    pub fn save_acked<T: Serialize>(&self, key: DocumentKey, document: &T) -> PendingSave {
        let (ack_tx, ack_rx) = oneshot::channel();
        match encode(key, document) {
            Ok(value) => self.enqueue(key, value, Some(ack_tx)),
            Err(err) => {
                let _ = ack_tx.send(Err(err));
            }
        }
        PendingSave { rx: ack_rx }
    }

    /// Save a typed document and wait for the store's verdict.
    pub async fn save_and_wait<T: Serialize>(
        &self,
        key: DocumentKey,
        document: &T,
    ) -> StorageResult<()> {
        self.save_acked(key, document).outcome().await
    }

    /// Wait until every write enqueued before this call has been attempted.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(PersistenceRequest::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    fn enqueue(
        &self,
        key: DocumentKey,
        document: Value,
        ack: Option<oneshot::Sender<StorageResult<()>>>,
    ) {
        let request = PersistenceRequest::Save { key, document, ack };
        if self.tx.send(request).is_err() {
            warn!(%key, "persistence worker stopped; document not persisted");
        }
    }
}

/// Receipt for a write queued with [`PersistenceHandle::save_acked`].
pub struct PendingSave {
    rx: oneshot::Receiver<StorageResult<()>>,
}

impl PendingSave {
    /// Wait for the store's verdict.
    pub async fn outcome(self) -> StorageResult<()> {
        self.rx.await.map_err(|err| {
            StorageError::unavailable("persistence worker stopped".into(), err)
        })?
    }
}

async fn run_worker(
    store: Arc<dyn DocumentStore>,
    mut rx: mpsc::UnboundedReceiver<PersistenceRequest>,
) {
    while let Some(request) = rx.recv().await {
        match request {
            PersistenceRequest::Save { key, document, ack } => {
                let result = store.save(key, document).await;
                match &result {
                    Ok(()) => debug!(%key, backend = store.describe(), "document persisted"),
                    Err(err) => warn!(
                        %key,
                        backend = store.describe(),
                        error = %err,
                        "failed to persist document"
                    ),
                }
                if let Some(ack) = ack {
                    let _ = ack.send(result);
                }
            }
            PersistenceRequest::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("persistence worker stopped");
}
