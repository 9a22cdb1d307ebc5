//! Fixtures shared by the service tests.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::{
    config::AppConfig,
    dao::document_store::MemoryDocumentStore,
    dto::ws::ServerMessage,
    state::{
        AppState, SharedState,
        board::{Board, BoardCatalog, Category, Question},
        gateway::ConnectionId,
        policy::{Identity, Role},
        registry::{Player, PlayerRegistry},
        session::GameSession,
    },
};

pub(crate) fn board() -> Board {
    Board {
        categories: vec![
            Category {
                name: "Rivers".into(),
                questions: vec![
                    Question {
                        question: "Longest river in Africa?".into(),
                        answer: "Nile".into(),
                        value: 200,
                        timer: None,
                    },
                    Question {
                        question: "River through Vienna?".into(),
                        answer: "Danube".into(),
                        value: 400,
                        timer: Some(3),
                    },
                ],
            },
            Category {
                name: "Peaks".into(),
                questions: vec![Question {
                    question: "Highest peak in the Alps?".into(),
                    answer: "Mont Blanc".into(),
                    value: 100,
                    timer: None,
                }],
            },
        ],
        multiplier: 1,
    }
}

pub(crate) fn player_record(username: &str, role: Role) -> Player {
    Player {
        username: username.into(),
        password: "secret".into(),
        role,
        score: 0,
    }
}

pub(crate) fn session(config: &AppConfig) -> GameSession {
    let mut boards = IndexMap::new();
    boards.insert("default".to_string(), board());
    let registry: PlayerRegistry = [
        player_record("host", Role::Admin),
        player_record("writer", Role::Editor),
        player_record("ada", Role::Player),
        player_record("bob", Role::Player),
    ]
    .into_iter()
    .collect();

    GameSession::new(
        BoardCatalog::new(boards, Some("default".into())),
        registry,
        config.scoring.clone(),
        config.default_timer_seconds,
    )
}

/// Application state backed by an in-memory store. Must run inside a runtime.
pub(crate) fn state_with(config: AppConfig) -> (SharedState, MemoryDocumentStore) {
    let store = MemoryDocumentStore::new();
    let session = session(&config);
    let state = AppState::new(config, Arc::new(store.clone()), session);
    (state, store)
}

pub(crate) fn state() -> SharedState {
    state_with(AppConfig::default()).0
}

pub(crate) fn admin() -> Identity {
    Identity::new("host", Role::Admin)
}

pub(crate) fn editor() -> Identity {
    Identity::new("writer", Role::Editor)
}

pub(crate) fn player(username: &str) -> Identity {
    Identity::new(username, Role::Player)
}

/// Register an in-process connection, optionally logged in.
pub(crate) fn connect(
    state: &SharedState,
    identity: Option<Identity>,
) -> (ConnectionId, UnboundedReceiver<ServerMessage>) {
    let (id, rx) = state.gateway().register();
    state.gateway().set_identity(id, identity);
    (id, rx)
}

/// Everything queued for a connection so far.
pub(crate) fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}
