//! Read-only projections of the session. Answers are only included for
//! viewers whose role may see them.

use crate::{
    dto::{board::BoardView, common::ScoreEntry, phase::RoundStateView},
    services::events,
    state::{
        SharedState,
        policy::{Identity, can_view_answers},
    },
};

/// Live board as seen by `viewer` (anonymous viewers get the player view).
pub async fn board(state: &SharedState, viewer: Option<&Identity>) -> BoardView {
    let session = state.session().lock().await;
    events::board_view(&session, privileged(viewer))
}

/// Every player's score.
pub async fn scores(state: &SharedState) -> Vec<ScoreEntry> {
    let session = state.session().lock().await;
    events::scoreboard(&session)
}

/// Round snapshot for resyncing clients.
pub async fn round_state(state: &SharedState, viewer: Option<&Identity>) -> RoundStateView {
    let session = state.session().lock().await;
    events::round_state(&session, privileged(viewer))
}

fn privileged(viewer: Option<&Identity>) -> bool {
    viewer.is_some_and(|identity| can_view_answers(identity.role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dto::phase::VisibleRoundPhase,
        services::{
            game_service,
            test_support::{admin, player, state},
        },
    };

    #[tokio::test]
    async fn scores_never_carry_credentials() {
        let state = state();
        let rows = serde_json::to_value(scores(&state).await).unwrap();
        let first = rows.as_array().unwrap().first().unwrap();
        assert_eq!(first["username"], "host");
        assert!(first.get("password").is_none());
    }

    #[tokio::test]
    async fn round_snapshot_tracks_the_buzz_winner() {
        let state = state();
        game_service::select_question(&state, &admin(), 1, 0)
            .await
            .unwrap();
        game_service::unlock_buzzers(&state, &admin()).await.unwrap();
        game_service::buzz(&state, &player("bob")).await;

        let snapshot = round_state(&state, None).await;
        assert_eq!(snapshot.phase, VisibleRoundPhase::AwaitingAnswer);
        assert_eq!(snapshot.buzz_winner.as_deref(), Some("bob"));
        assert!(snapshot.buzz_locked);
        let question = snapshot.question.unwrap();
        assert_eq!(question.category, "Peaks");
        assert!(question.answer.is_none());

        let privileged = round_state(&state, Some(&admin())).await;
        assert_eq!(
            privileged.question.and_then(|question| question.answer),
            Some("Mont Blanc".to_string())
        );
    }
}
