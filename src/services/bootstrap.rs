//! Startup wiring: open the configured document store and rebuild the session
//! from whatever it holds.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::{AppConfig, StorageBackend, StorageConfig},
    dao::{
        document_store::{
            DocumentKey, DocumentStore, FallbackDocumentStore, FileDocumentStore,
            MemoryDocumentStore,
        },
        models::{BoardsDocument, PlayerEntity},
        repository::Repository,
        storage::StorageResult,
    },
    state::{
        board::BoardCatalog,
        policy::Role,
        registry::{Player, PlayerRegistry},
        session::GameSession,
    },
};

/// Open the document store selected by the configuration.
pub async fn open_store(storage: &StorageConfig) -> StorageResult<Arc<dyn DocumentStore>> {
    let file = || -> Arc<dyn DocumentStore> { Arc::new(FileDocumentStore::new(&storage.data_dir)) };

    let store: Arc<dyn DocumentStore> = match storage.backend {
        StorageBackend::File => file(),
        StorageBackend::Memory => Arc::new(MemoryDocumentStore::new()),
        StorageBackend::Couch => connect_couch().await?,
        StorageBackend::CouchWithFileFallback => match connect_couch().await {
            Ok(couch) => Arc::new(FallbackDocumentStore::new(couch, file())),
            Err(err) => {
                warn!(error = %err, "CouchDB unavailable; using the file store only");
                file()
            }
        },
    };

    info!(backend = store.describe(), "document store ready");
    Ok(store)
}

#[cfg(feature = "couch-store")]
async fn connect_couch() -> StorageResult<Arc<dyn DocumentStore>> {
    use crate::dao::document_store::couchdb::{CouchConfig, CouchDocumentStore};

    let config = CouchConfig::from_env()?;
    let store = CouchDocumentStore::connect(config).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "couch-store"))]
async fn connect_couch() -> StorageResult<Arc<dyn DocumentStore>> {
    Err(crate::dao::storage::StorageError::unavailable(
        "CouchDB backend requested".into(),
        std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "built without the `couch-store` feature",
        ),
    ))
}

/// Rebuild the session from the store.
///
/// Missing documents are created empty. A document that fails to load is
/// left untouched and the session starts without its content.
pub async fn load_session(repository: &Repository, config: &AppConfig) -> GameSession {
    let (mut registry, users_writable) = match repository.load_users().await {
        Ok(Some(users)) => (users.into_iter().map(Player::from).collect(), true),
        Ok(None) => {
            info!("no users document; creating an empty one");
            seed(repository, DocumentKey::Users, &Vec::<PlayerEntity>::new()).await;
            (PlayerRegistry::default(), true)
        }
        Err(err) => {
            warn!(error = %err, "failed to load users; starting without any");
            (PlayerRegistry::default(), false)
        }
    };

    if users_writable && registry.is_empty() {
        if let Some(admin) = &config.bootstrap_admin {
            let player = Player {
                username: admin.username.clone(),
                password: admin.password.clone(),
                role: Role::Admin,
                score: 0,
            };
            match registry.add(player) {
                Ok(_) => {
                    info!(username = %admin.username, "bootstrap admin created");
                    seed(repository, DocumentKey::Users, &registry.to_entities()).await;
                }
                Err(err) => warn!(error = %err, "failed to create bootstrap admin"),
            }
        }
    }

    let boards = match repository.load_boards().await {
        Ok(Some(document)) => document,
        Ok(None) => {
            info!("no boards document; creating an empty one");
            let document = BoardsDocument::default();
            seed(repository, DocumentKey::Boards, &document).await;
            document
        }
        Err(err) => {
            warn!(error = %err, "failed to load boards; starting without any");
            BoardsDocument::default()
        }
    };

    let active = match repository.load_active_game().await {
        Ok(pointer) => pointer.map(|pointer| pointer.board),
        Err(err) => {
            warn!(error = %err, "failed to load the active board pointer");
            None
        }
    };

    let catalog = BoardCatalog::new(boards.into(), active);
    info!(
        users = registry.len(),
        boards = catalog.iter().count(),
        active = ?catalog.active_name(),
        "session restored"
    );

    GameSession::new(
        catalog,
        registry,
        config.scoring.clone(),
        config.default_timer_seconds,
    )
}

async fn seed<T: Serialize>(repository: &Repository, key: DocumentKey, document: &T) {
    if let Err(err) = repository.save(key, document).await {
        warn!(%key, error = %err, "failed to create document");
    }
}
