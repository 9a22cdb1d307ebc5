//! Round control and answer handling. Every operation holds the session lock
//! for its whole turn: the mutation and the broadcast it triggers happen
//! before any other event is processed, and persistence is only enqueued.

use tracing::info;

use crate::{
    dto::ws::{AnswerPayload, ServerMessage},
    error::ServiceError,
    services::{countdown, events},
    state::{
        SharedState,
        policy::Identity,
        session::{ScoreChange, Verdict},
    },
};

/// Show the question at the given coordinates of the live board.
pub async fn select_question(
    state: &SharedState,
    actor: &Identity,
    category_index: usize,
    question_index: usize,
) -> Result<(), ServiceError> {
    let mut session = state.session().lock().await;
    let question = session.select_question(actor, category_index, question_index)?;
    events::broadcast_question_selected(state, question);
    Ok(())
}

/// Open buzzing and (re)start the countdown. Any running countdown is
/// cancelled first.
pub async fn start_timer(state: &SharedState, actor: &Identity) -> Result<(), ServiceError> {
    let mut session = state.session().lock().await;
    let (generation, seconds) = session.start_timer(actor)?;
    countdown::spawn_countdown(state, &mut session, generation);
    info!(admin = %actor.username, seconds, generation, "countdown started");
    state.gateway().broadcast(ServerMessage::BuzzersUnlocked);
    Ok(())
}

/// Open buzzing without a countdown.
pub async fn unlock_buzzers(state: &SharedState, actor: &Identity) -> Result<(), ServiceError> {
    let mut session = state.session().lock().await;
    session.unlock_buzzers(actor)?;
    state.gateway().broadcast(ServerMessage::BuzzersUnlocked);
    Ok(())
}

/// Dismiss the current question and return to idle.
pub async fn close_question(state: &SharedState, actor: &Identity) -> Result<(), ServiceError> {
    let mut session = state.session().lock().await;
    session.close_question(actor)?;
    info!(admin = %actor.username, "question closed");
    state.gateway().broadcast(ServerMessage::QuestionClosed);
    Ok(())
}

/// Register a buzz. Only the winning signal produces a broadcast; every
/// other signal is dropped silently.
pub async fn buzz(state: &SharedState, actor: &Identity) {
    let mut session = state.session().lock().await;
    if let Some(winner) = session.buzz(actor) {
        state.gateway().broadcast(ServerMessage::BuzzUpdate(winner));
    }
}

/// Score an answer and broadcast the new scoreboard.
pub async fn submit_answer(
    state: &SharedState,
    actor: &Identity,
    payload: AnswerPayload,
) -> Result<ScoreChange, ServiceError> {
    let AnswerPayload {
        username,
        correct,
        response,
    } = payload;
    let responder = username.unwrap_or_else(|| actor.username.clone());
    let verdict = match (correct, response) {
        (Some(correct), _) => Verdict::Declared(correct),
        (None, Some(response)) => Verdict::Response(response),
        (None, None) => {
            return Err(ServiceError::InvalidInput(
                "answer requires `correct` or `response`".into(),
            ));
        }
    };

    let mut session = state.session().lock().await;
    let change = session.submit_answer(actor, &responder, verdict)?;
    events::broadcast_scores(state, &session);
    state.persist_users(&session);
    Ok(change)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time;

    use super::*;
    use crate::{
        dao::document_store::DocumentKey,
        dto::board::QuestionView,
        services::{
            public_service::{board, round_state},
            test_support::{admin, connect, drain, editor, player, state, state_with},
        },
        state::{scoring::Responder, state_machine::RoundPhase},
    };

    fn timer_messages(messages: Vec<ServerMessage>) -> Vec<ServerMessage> {
        messages
            .into_iter()
            .filter(|message| {
                matches!(
                    message,
                    ServerMessage::TimerUpdate(_) | ServerMessage::TimerEnded
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn selected_question_is_tailored_per_role() {
        let state = state();
        let (_, mut host_rx) = connect(&state, Some(admin()));
        let (_, mut writer_rx) = connect(&state, Some(editor()));
        let (_, mut ada_rx) = connect(&state, Some(player("ada")));
        let (_, mut anon_rx) = connect(&state, None);

        select_question(&state, &admin(), 0, 0).await.unwrap();

        let answer_of = |messages: Vec<ServerMessage>| match messages.as_slice() {
            [ServerMessage::QuestionSelected(QuestionView { answer, .. })] => answer.clone(),
            other => panic!("unexpected messages {other:?}"),
        };
        assert_eq!(answer_of(drain(&mut host_rx)), Some("Nile".to_string()));
        assert_eq!(answer_of(drain(&mut writer_rx)), Some("Nile".to_string()));
        assert_eq!(answer_of(drain(&mut ada_rx)), None);
        assert_eq!(answer_of(drain(&mut anon_rx)), None);
    }

    #[tokio::test]
    async fn players_cannot_drive_the_round() {
        let state = state();
        let (_, mut rx) = connect(&state, Some(player("ada")));

        let err = select_question(&state, &player("ada"), 0, 0).await.unwrap_err();
        assert!(matches!(err, ServiceError::PermissionDenied(_)));
        select_question(&state, &admin(), 0, 0).await.unwrap();
        drain(&mut rx);

        for err in [
            start_timer(&state, &player("ada")).await.unwrap_err(),
            unlock_buzzers(&state, &player("ada")).await.unwrap_err(),
            close_question(&state, &editor()).await.unwrap_err(),
        ] {
            assert!(matches!(err, ServiceError::PermissionDenied(_)));
        }
        assert!(drain(&mut rx).is_empty());
        let session = state.session().lock().await;
        assert_eq!(*session.round().phase(), RoundPhase::QuestionShown);
    }

    #[tokio::test(start_paused = true)]
    async fn default_countdown_emits_thirty_ticks_then_ends() {
        let state = state();
        let (_, mut rx) = connect(&state, Some(player("ada")));
        select_question(&state, &admin(), 0, 0).await.unwrap();
        start_timer(&state, &admin()).await.unwrap();

        time::sleep(Duration::from_millis(30_500)).await;

        let mut expected: Vec<ServerMessage> =
            (0..30).rev().map(ServerMessage::TimerUpdate).collect();
        expected.push(ServerMessage::TimerEnded);
        assert_eq!(timer_messages(drain(&mut rx)), expected);

        time::sleep(Duration::from_secs(5)).await;
        assert!(drain(&mut rx).is_empty());

        let session = state.session().lock().await;
        assert_eq!(*session.round().phase(), RoundPhase::Expired);
        assert!(session.round().buzz_locked());
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_the_timer_keeps_a_single_tick_stream() {
        let state = state();
        let (_, mut rx) = connect(&state, None);
        select_question(&state, &admin(), 0, 1).await.unwrap();

        start_timer(&state, &admin()).await.unwrap();
        time::sleep(Duration::from_millis(1_500)).await;
        start_timer(&state, &admin()).await.unwrap();
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(
            timer_messages(drain(&mut rx)),
            vec![
                ServerMessage::TimerUpdate(2),
                ServerMessage::TimerUpdate(1),
                ServerMessage::TimerUpdate(0),
                ServerMessage::TimerEnded,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn winning_buzz_freezes_the_countdown() {
        let state = state();
        let (_, mut rx) = connect(&state, Some(player("bob")));
        select_question(&state, &admin(), 0, 0).await.unwrap();
        start_timer(&state, &admin()).await.unwrap();

        time::sleep(Duration::from_millis(2_500)).await;
        buzz(&state, &player("ada")).await;
        buzz(&state, &player("bob")).await;
        time::sleep(Duration::from_secs(10)).await;

        let messages = drain(&mut rx);
        let winners: Vec<_> = messages
            .iter()
            .filter(|message| matches!(message, ServerMessage::BuzzUpdate(_)))
            .collect();
        assert_eq!(winners, vec![&ServerMessage::BuzzUpdate("ada".into())]);
        assert_eq!(
            timer_messages(messages),
            vec![ServerMessage::TimerUpdate(29), ServerMessage::TimerUpdate(28)]
        );

        let session = state.session().lock().await;
        assert_eq!(session.round().remaining_seconds(), 28);
        assert_eq!(session.round().buzz_winner(), Some("ada"));
    }

    #[tokio::test(start_paused = true)]
    async fn new_question_cancels_the_running_countdown() {
        let state = state();
        let (_, mut rx) = connect(&state, None);
        select_question(&state, &admin(), 0, 0).await.unwrap();
        start_timer(&state, &admin()).await.unwrap();
        time::sleep(Duration::from_millis(1_500)).await;

        select_question(&state, &admin(), 1, 0).await.unwrap();
        time::sleep(Duration::from_secs(5)).await;

        assert_eq!(
            timer_messages(drain(&mut rx)),
            vec![ServerMessage::TimerUpdate(29)]
        );
        let session = state.session().lock().await;
        assert_eq!(session.round().remaining_seconds(), 30);
        assert!(!session.round().countdown_running());
    }

    #[tokio::test]
    async fn buzz_before_unlock_is_dropped() {
        let state = state();
        let (_, mut rx) = connect(&state, None);
        select_question(&state, &admin(), 0, 0).await.unwrap();
        drain(&mut rx);

        buzz(&state, &player("ada")).await;
        assert!(drain(&mut rx).is_empty());

        unlock_buzzers(&state, &admin()).await.unwrap();
        buzz(&state, &player("bob")).await;
        assert_eq!(
            drain(&mut rx),
            vec![
                ServerMessage::BuzzersUnlocked,
                ServerMessage::BuzzUpdate("bob".into())
            ]
        );
    }

    #[tokio::test]
    async fn winner_answer_updates_scores_and_persists_users() {
        let (state, store) = state_with(Default::default());
        let (_, mut rx) = connect(&state, None);
        select_question(&state, &admin(), 0, 0).await.unwrap();
        unlock_buzzers(&state, &admin()).await.unwrap();
        buzz(&state, &player("ada")).await;
        drain(&mut rx);

        let change = submit_answer(
            &state,
            &admin(),
            AnswerPayload {
                username: Some("ada".into()),
                correct: Some(true),
                response: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(change.responder, Responder::BuzzWinner);
        assert_eq!(change.score, 200);

        match drain(&mut rx).as_slice() {
            [ServerMessage::ScoreUpdate(rows)] => {
                let ada = rows.iter().find(|row| row.username == "ada").unwrap();
                assert_eq!(ada.score, 200);
            }
            other => panic!("unexpected messages {other:?}"),
        }

        state.persistence().flush().await;
        let users = store.get(DocumentKey::Users).unwrap();
        let ada = users
            .as_array()
            .unwrap()
            .iter()
            .find(|user| user["username"] == "ada")
            .unwrap();
        assert_eq!(ada["score"], 200);
    }

    #[tokio::test]
    async fn player_response_is_judged_against_the_expected_answer() {
        let state = state();
        select_question(&state, &admin(), 0, 0).await.unwrap();
        unlock_buzzers(&state, &admin()).await.unwrap();
        buzz(&state, &player("ada")).await;

        let change = submit_answer(
            &state,
            &player("ada"),
            AnswerPayload {
                username: None,
                correct: None,
                response: Some("  nile ".into()),
            },
        )
        .await
        .unwrap();
        assert!(change.correct);
        assert_eq!(change.username, "ada");
    }

    #[tokio::test]
    async fn answer_without_verdict_is_rejected() {
        let state = state();
        let err = submit_answer(
            &state,
            &admin(),
            AnswerPayload {
                username: Some("ada".into()),
                correct: None,
                response: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn close_question_returns_to_idle() {
        let state = state();
        let (_, mut rx) = connect(&state, None);
        select_question(&state, &admin(), 0, 0).await.unwrap();
        drain(&mut rx);

        close_question(&state, &admin()).await.unwrap();
        assert_eq!(drain(&mut rx), vec![ServerMessage::QuestionClosed]);

        let snapshot = round_state(&state, None).await;
        assert!(snapshot.question.is_none());
        assert!(matches!(
            close_question(&state, &admin()).await,
            Err(ServiceError::InvalidSelection(_))
        ));
    }

    #[tokio::test]
    async fn board_hides_answers_from_players() {
        let state = state();
        let hidden = board(&state, Some(&player("ada"))).await;
        assert!(hidden.categories[0].questions[0].answer.is_none());

        let shown = board(&state, Some(&editor())).await;
        assert_eq!(
            shown.categories[0].questions[0].answer.as_deref(),
            Some("Nile")
        );
    }
}
