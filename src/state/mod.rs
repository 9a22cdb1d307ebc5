pub mod board;
pub mod gateway;
pub mod policy;
pub mod registry;
pub mod round;
pub mod scoring;
pub mod session;
mod sse;
pub mod state_machine;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        document_store::{DocumentKey, DocumentStore},
        models::ActiveGameEntity,
    },
    dto::format_system_time,
    services::persistence::{PendingSave, PersistenceHandle},
};

pub use self::sse::SseHub;
use self::{gateway::BroadcastGateway, policy::Identity, session::GameSession};

pub type SharedState = Arc<AppState>;

/// Capacity of the spectator SSE channel.
const PUBLIC_SSE_CAPACITY: usize = 64;

/// Central application state: the session context, live connections, issued
/// tokens, and the persistence queue.
pub struct AppState {
    config: AppConfig,
    session: Mutex<GameSession>,
    gateway: BroadcastGateway,
    tokens: DashMap<String, Identity>,
    store: Arc<dyn DocumentStore>,
    persistence: PersistenceHandle,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Spawns the persistence worker, so this must run inside a Tokio runtime.
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>, session: GameSession) -> SharedState {
        let (persistence, _worker) = PersistenceHandle::spawn(store.clone());
        Arc::new(Self {
            config,
            session: Mutex::new(session),
            gateway: BroadcastGateway::new(PUBLIC_SSE_CAPACITY),
            tokens: DashMap::new(),
            store,
            persistence,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The single session. Handlers hold the lock for their whole synchronous
    /// turn (mutation and broadcast) and never across storage I/O.
    pub fn session(&self) -> &Mutex<GameSession> {
        &self.session
    }

    /// Connection registry and broadcast fan-out.
    pub fn gateway(&self) -> &BroadcastGateway {
        &self.gateway
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        self.gateway.public_sse()
    }

    /// Configured document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Queue of pending document writes.
    pub fn persistence(&self) -> &PersistenceHandle {
        &self.persistence
    }

    /// Issue a session token for `identity`.
    pub fn issue_token(&self, identity: Identity) -> String {
        let token = Uuid::new_v4().simple().to_string();
        debug!(username = %identity.username, "session token issued");
        self.tokens.insert(token.clone(), identity);
        token
    }

    /// Resolve a session token.
    pub fn resolve_token(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token).map(|entry| entry.value().clone())
    }

    /// Invalidate every token and live login of `username`.
    pub fn revoke_user(&self, username: &str) {
        self.tokens.retain(|_, identity| identity.username != username);
        self.gateway.revoke_user(username);
    }

    /// Queue a snapshot of the registry.
    pub fn persist_users(&self, session: &GameSession) {
        self.persistence
            .save(DocumentKey::Users, &session.registry().to_entities());
    }

    /// Queue the live board pointer and return the write receipt.
    #[must_use]
    pub fn persist_active_game(&self, session: &GameSession) -> Option<PendingSave> {
        let name = session.catalog().active_name()?;
        let pointer = ActiveGameEntity {
            board: name.to_string(),
            activated_at: Some(format_system_time(std::time::SystemTime::now())),
        };
        Some(
            self.persistence
                .save_acked(DocumentKey::ActiveGame, &pointer),
        )
    }
}
