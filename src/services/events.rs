//! Builders for the messages fanned out to every connection. Payloads that
//! carry expected answers go out in two flavours: with answers for admins and
//! editors, without for players and spectators.

use crate::{
    dto::{
        board::{BoardView, QuestionView},
        common::ScoreEntry,
        phase::RoundStateView,
        ws::ServerMessage,
    },
    state::{SharedState, round::ActiveQuestion, session::GameSession},
};

/// Scoreboard rows in registration order.
pub fn scoreboard(session: &GameSession) -> Vec<ScoreEntry> {
    session.registry().iter().map(ScoreEntry::from).collect()
}

/// View of the live board, or an empty board when none is active.
pub fn board_view(session: &GameSession, include_answers: bool) -> BoardView {
    session
        .catalog()
        .active_board()
        .map(|board| BoardView::from_board(board, include_answers))
        .unwrap_or_else(BoardView::empty)
}

/// Round snapshot for a resyncing client.
pub fn round_state(session: &GameSession, include_answer: bool) -> RoundStateView {
    RoundStateView::from_snapshot(&session.round_snapshot(), include_answer)
}

/// Broadcast the live board.
pub fn broadcast_board(state: &SharedState, session: &GameSession) {
    state.gateway().broadcast_tailored(
        ServerMessage::BoardData(board_view(session, false)),
        ServerMessage::BoardData(board_view(session, true)),
    );
}

/// Broadcast a freshly selected question.
pub fn broadcast_question_selected(state: &SharedState, question: &ActiveQuestion) {
    state.gateway().broadcast_tailored(
        ServerMessage::QuestionSelected(QuestionView::from_active(question, false)),
        ServerMessage::QuestionSelected(QuestionView::from_active(question, true)),
    );
}

/// Broadcast every player's score.
pub fn broadcast_scores(state: &SharedState, session: &GameSession) {
    state
        .gateway()
        .broadcast(ServerMessage::ScoreUpdate(scoreboard(session)));
}
