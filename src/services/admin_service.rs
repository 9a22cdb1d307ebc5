//! Business logic behind the admin REST routes: user and board management.
//!
//! Mutations run under the session lock and enqueue their snapshot before the
//! lock is released, so writes reach the store in the order they happened.
//! The handler then waits for the store but reports success either way: a
//! failed write only means the change lives in memory until the next save.

use tracing::{debug, info};

use crate::{
    dao::document_store::DocumentKey,
    dto::{
        admin::{
            ActionResponse, BoardSummary, CreateUserRequest, SaveBoardRequest, UpdateUserRequest,
            UserSummary,
        },
        board::BoardInput,
    },
    error::ServiceError,
    services::{events, persistence::PendingSave},
    state::{
        SharedState,
        board::DEFAULT_BOARD_NAME,
        policy::{Action, Identity, authorize},
        session::GameSession,
    },
};

/// List every registered user.
pub async fn list_users(
    state: &SharedState,
    actor: &Identity,
) -> Result<Vec<UserSummary>, ServiceError> {
    authorize(actor, Action::ManageUsers)?;
    let session = state.session().lock().await;
    Ok(session.registry().iter().map(UserSummary::from).collect())
}

/// Register a new user with a zero score.
pub async fn create_user(
    state: &SharedState,
    actor: &Identity,
    request: CreateUserRequest,
) -> Result<UserSummary, ServiceError> {
    let (summary, pending) = {
        let mut session = state.session().lock().await;
        let summary = UserSummary::from(session.add_player(actor, request.into())?);
        events::broadcast_scores(state, &session);
        (summary, save_users(state, &session))
    };

    info!(admin = %actor.username, username = %summary.username, "user created");
    settle(pending).await;
    Ok(summary)
}

/// Change the password, role, or score of a user. A role change logs the
/// user out everywhere.
pub async fn update_user(
    state: &SharedState,
    actor: &Identity,
    username: &str,
    request: UpdateUserRequest,
) -> Result<UserSummary, ServiceError> {
    let (summary, role_changed, pending) = {
        let mut session = state.session().lock().await;
        let previous_role = session.registry().get(username).map(|player| player.role);
        let summary = UserSummary::from(session.update_player(actor, username, request.into())?);
        let role_changed = previous_role.is_some_and(|role| role != summary.role);
        if role_changed {
            state.revoke_user(username);
        }
        events::broadcast_scores(state, &session);
        (summary, role_changed, save_users(state, &session))
    };

    info!(admin = %actor.username, %username, role_changed, "user updated");
    settle(pending).await;
    Ok(summary)
}

/// Delete a user between questions and revoke their sessions.
pub async fn delete_user(
    state: &SharedState,
    actor: &Identity,
    username: &str,
) -> Result<ActionResponse, ServiceError> {
    let pending = {
        let mut session = state.session().lock().await;
        session.remove_player(actor, username)?;
        state.revoke_user(username);
        events::broadcast_scores(state, &session);
        save_users(state, &session)
    };

    info!(admin = %actor.username, %username, "user deleted");
    settle(pending).await;
    Ok(ActionResponse::new(format!("user `{username}` deleted")))
}

/// List every stored board.
pub async fn list_boards(
    state: &SharedState,
    actor: &Identity,
) -> Result<Vec<BoardSummary>, ServiceError> {
    authorize(actor, Action::EditBoards)?;
    let session = state.session().lock().await;
    let active = session.catalog().active_name();
    Ok(session
        .catalog()
        .iter()
        .map(|(name, board)| BoardSummary::new(name, board, active == Some(name.as_str())))
        .collect())
}

/// Create or replace a named board. Changes to the live board are pushed to
/// every client.
pub async fn save_board(
    state: &SharedState,
    actor: &Identity,
    request: SaveBoardRequest,
) -> Result<BoardSummary, ServiceError> {
    let SaveBoardRequest { name, board } = request;
    let (summary, pending) = {
        let mut session = state.session().lock().await;
        session.save_board(actor, &name, board.into())?;
        let summary = stored_board_summary(&session, &name)?;
        if summary.active {
            events::broadcast_board(state, &session);
        }
        (summary, save_boards(state, &session))
    };

    info!(editor = %actor.username, board = %name, "board saved");
    settle(pending).await;
    Ok(summary)
}

/// Delete a board that is not live.
pub async fn delete_board(
    state: &SharedState,
    actor: &Identity,
    name: &str,
) -> Result<ActionResponse, ServiceError> {
    let pending = {
        let mut session = state.session().lock().await;
        session.delete_board(actor, name)?;
        save_boards(state, &session)
    };

    info!(editor = %actor.username, board = %name, "board deleted");
    settle(pending).await;
    Ok(ActionResponse::new(format!("board `{name}` deleted")))
}

/// Make a board live. The round is reset and the board pushed to everyone.
pub async fn activate_board(
    state: &SharedState,
    actor: &Identity,
    name: &str,
) -> Result<BoardSummary, ServiceError> {
    let (summary, pending) = {
        let mut session = state.session().lock().await;
        session.activate_board(actor, name)?;
        events::broadcast_board(state, &session);
        let summary = stored_board_summary(&session, name)?;
        (summary, state.persist_active_game(&session))
    };

    info!(admin = %actor.username, board = %name, "board activated");
    if let Some(pending) = pending {
        settle(pending).await;
    }
    Ok(summary)
}

/// Legacy single-board save: store the board as `default` and make it live.
pub async fn save_legacy_board(
    state: &SharedState,
    actor: &Identity,
    board: BoardInput,
) -> Result<BoardSummary, ServiceError> {
    authorize(actor, Action::ActivateBoard)?;
    let (summary, pending, pointer) = {
        let mut session = state.session().lock().await;
        session.save_board(actor, DEFAULT_BOARD_NAME, board.into())?;
        let pointer = if session.catalog().active_name() != Some(DEFAULT_BOARD_NAME) {
            session.activate_board(actor, DEFAULT_BOARD_NAME)?;
            state.persist_active_game(&session)
        } else {
            None
        };
        events::broadcast_board(state, &session);
        (
            stored_board_summary(&session, DEFAULT_BOARD_NAME)?,
            save_boards(state, &session),
            pointer,
        )
    };

    info!(admin = %actor.username, "legacy board saved and activated");
    settle(pending).await;
    if let Some(pointer) = pointer {
        settle(pointer).await;
    }
    Ok(summary)
}

fn stored_board_summary(session: &GameSession, name: &str) -> Result<BoardSummary, ServiceError> {
    let board = session
        .catalog()
        .get(name)
        .ok_or_else(|| ServiceError::NotFound(format!("board `{name}`")))?;
    Ok(BoardSummary::new(
        name,
        board,
        session.catalog().active_name() == Some(name),
    ))
}

fn save_users(state: &SharedState, session: &GameSession) -> PendingSave {
    state
        .persistence()
        .save_acked(DocumentKey::Users, &session.registry().to_entities())
}

fn save_boards(state: &SharedState, session: &GameSession) -> PendingSave {
    state
        .persistence()
        .save_acked(DocumentKey::Boards, &session.catalog().to_document())
}

async fn settle(pending: PendingSave) {
    if let Err(err) = pending.outcome().await {
        debug!(error = %err, "change kept in memory only");
    }
}
