use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{board::BoardView, common::ScoreEntry, phase::RoundStateView},
    services::public_service,
    state::SharedState,
};

/// Public read-only endpoints exposing the live game. Answers are never
/// included.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/board", get(get_board))
        .route("/public/scores", get(get_scores))
        .route("/public/round", get(get_round))
}

#[utoipa::path(
    get,
    path = "/public/board",
    tag = "public",
    responses((status = 200, description = "Live board without answers", body = BoardView))
)]
/// Return the live board as players see it.
pub async fn get_board(State(state): State<SharedState>) -> Json<BoardView> {
    Json(public_service::board(&state, None).await)
}

#[utoipa::path(
    get,
    path = "/public/scores",
    tag = "public",
    responses((status = 200, description = "Scoreboard", body = [ScoreEntry]))
)]
/// Return every player's score.
pub async fn get_scores(State(state): State<SharedState>) -> Json<Vec<ScoreEntry>> {
    Json(public_service::scores(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/round",
    tag = "public",
    responses((status = 200, description = "Current round snapshot", body = RoundStateView))
)]
/// Return the round snapshot used by clients to resync after reconnecting.
pub async fn get_round(State(state): State<SharedState>) -> Json<RoundStateView> {
    Json(public_service::round_state(&state, None).await)
}
