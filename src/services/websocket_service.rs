use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    dto::{
        common::{ErrorPayload, LoginRequest},
        ws::{ClientMessage, ServerMessage},
    },
    error::ServiceError,
    services::{auth_service, game_service, public_service},
    state::{SharedState, gateway::ConnectionId},
};

/// Handle the full lifecycle of one client WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (connection, mut outbound_rx) = state.gateway().register();
    info!(%connection, "websocket connected");

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(err) => {
                    warn!(event = message.event_name(), error = %err, "failed to encode outbound message");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                debug!(%connection, payload = %text.as_str(), "received client message");
                match ClientMessage::from_json_str(text.as_str()) {
                    Ok(inbound) => dispatch(&state, connection, inbound).await,
                    Err(err) => {
                        warn!(%connection, error = %err, "failed to parse client message");
                        reject(
                            &state,
                            connection,
                            &ServiceError::InvalidInput(format!("malformed message: {err}")),
                        );
                    }
                }
            }
            Ok(Message::Close(_)) => {
                info!(%connection, "websocket closed by client");
                break;
            }
            Ok(Message::Binary(_) | Message::Ping(_) | Message::Pong(_)) => {}
            Err(err) => {
                warn!(%connection, error = %err, "websocket error");
                break;
            }
        }
    }

    state.gateway().unregister(connection);
    info!(%connection, "websocket disconnected");

    finalize(writer_task).await;
}

/// Route one inbound message. Failures are reported to the sender only.
pub async fn dispatch(state: &SharedState, connection: ConnectionId, message: ClientMessage) {
    if let Err(err) = handle_message(state, connection, message).await {
        debug!(%connection, kind = err.kind(), error = %err, "client request rejected");
        reject(state, connection, &err);
    }
}

async fn handle_message(
    state: &SharedState,
    connection: ConnectionId,
    message: ClientMessage,
) -> Result<(), ServiceError> {
    let identity = state.gateway().identity(connection);
    let actor = || {
        identity
            .as_ref()
            .ok_or_else(|| ServiceError::Unauthenticated("login required".into()))
    };

    match message {
        ClientMessage::Login(request) => login(state, connection, &request).await,
        ClientMessage::GetBoard => {
            let board = public_service::board(state, identity.as_ref()).await;
            reply(state, connection, ServerMessage::BoardData(board));
        }
        ClientMessage::GetState => {
            let view = public_service::round_state(state, Some(actor()?)).await;
            reply(state, connection, ServerMessage::RoundState(view));
        }
        ClientMessage::SelectQuestion(payload) => {
            game_service::select_question(
                state,
                actor()?,
                payload.category_index,
                payload.question_index,
            )
            .await?;
        }
        ClientMessage::StartTimer => game_service::start_timer(state, actor()?).await?,
        ClientMessage::UnlockBuzzers => game_service::unlock_buzzers(state, actor()?).await?,
        ClientMessage::CloseQuestion => game_service::close_question(state, actor()?).await?,
        ClientMessage::Buzz(_) => game_service::buzz(state, actor()?).await,
        ClientMessage::Answer(payload) => {
            game_service::submit_answer(state, actor()?, payload).await?;
        }
        ClientMessage::GetScores => {
            actor()?;
            let rows = public_service::scores(state).await;
            reply(state, connection, ServerMessage::ScoreUpdate(rows));
        }
    }
    Ok(())
}

async fn login(state: &SharedState, connection: ConnectionId, request: &LoginRequest) {
    match auth_service::login(state, request).await {
        Ok((identity, response)) => {
            state.gateway().set_identity(connection, Some(identity));
            reply(state, connection, ServerMessage::LoginSuccess(response));
        }
        Err(err) => {
            let reason = match err {
                ServiceError::Unauthenticated(message) => message,
                other => other.to_string(),
            };
            reply(state, connection, ServerMessage::LoginFail(reason));
        }
    }
}

fn reply(state: &SharedState, connection: ConnectionId, message: ServerMessage) {
    if !state.gateway().send_to(connection, message) {
        debug!(%connection, "reply dropped; connection gone");
    }
}

fn reject(state: &SharedState, connection: ConnectionId, err: &ServiceError) {
    reply(state, connection, ServerMessage::Error(ErrorPayload::from(err)));
}

async fn finalize(writer_task: JoinHandle<()>) {
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{admin, connect, drain, player, state};

    fn parse(text: &str) -> ClientMessage {
        ClientMessage::from_json_str(text).unwrap()
    }

    fn error_kind(messages: &[ServerMessage]) -> Option<&str> {
        match messages {
            [ServerMessage::Error(payload)] => Some(payload.kind.as_str()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn login_attaches_the_identity_to_the_connection() {
        let state = state();
        let (connection, mut rx) = connect(&state, None);

        dispatch(
            &state,
            connection,
            parse(r#"{"event":"login","data":{"username":"ada","password":"wrong"}}"#),
        )
        .await;
        assert_eq!(
            drain(&mut rx),
            vec![ServerMessage::LoginFail("invalid credentials".into())]
        );
        assert!(state.gateway().identity(connection).is_none());

        dispatch(
            &state,
            connection,
            parse(r#"{"event":"login","data":{"username":"ada","password":"secret"}}"#),
        )
        .await;
        match drain(&mut rx).as_slice() {
            [ServerMessage::LoginSuccess(response)] => {
                assert_eq!(response.username, "ada");
                assert!(state.resolve_token(&response.token).is_some());
            }
            other => panic!("unexpected messages {other:?}"),
        }
        assert_eq!(state.gateway().identity(connection), Some(player("ada")));
    }

    #[tokio::test]
    async fn anonymous_connections_may_only_read_the_board() {
        let state = state();
        let (connection, mut rx) = connect(&state, None);

        dispatch(&state, connection, parse(r#"{"event":"getBoard"}"#)).await;
        assert!(matches!(
            drain(&mut rx).as_slice(),
            [ServerMessage::BoardData(_)]
        ));

        for text in [
            r#"{"event":"startTimer"}"#,
            r#"{"event":"buzz","data":"ada"}"#,
            r#"{"event":"getScores"}"#,
        ] {
            dispatch(&state, connection, parse(text)).await;
            assert_eq!(error_kind(&drain(&mut rx)), Some("unauthenticated"));
        }
    }

    #[tokio::test]
    async fn errors_reach_only_the_sender() {
        let state = state();
        let (ada, mut ada_rx) = connect(&state, Some(player("ada")));
        let (_, mut bob_rx) = connect(&state, Some(player("bob")));

        dispatch(
            &state,
            ada,
            parse(r#"{"event":"selectQuestion","data":{"categoryIndex":0,"questionIndex":0,"admin":true}}"#),
        )
        .await;

        assert_eq!(error_kind(&drain(&mut ada_rx)), Some("permissionDenied"));
        assert!(drain(&mut bob_rx).is_empty());
        assert!(state.session().lock().await.round().active_question().is_none());
    }

    #[tokio::test]
    async fn only_the_first_buzz_is_announced() {
        let state = state();
        let (host, mut host_rx) = connect(&state, Some(admin()));
        let (ada, _ada_rx) = connect(&state, Some(player("ada")));
        let (bob, mut bob_rx) = connect(&state, Some(player("bob")));

        dispatch(
            &state,
            host,
            parse(r#"{"event":"selectQuestion","data":{"categoryIndex":0,"questionIndex":0}}"#),
        )
        .await;
        dispatch(&state, host, parse(r#"{"event":"unlockBuzzers"}"#)).await;
        drain(&mut host_rx);
        drain(&mut bob_rx);

        dispatch(&state, bob, parse(r#"{"event":"buzz","data":"bob"}"#)).await;
        dispatch(&state, ada, parse(r#"{"event":"buzz","data":"ada"}"#)).await;

        assert_eq!(
            drain(&mut host_rx),
            vec![ServerMessage::BuzzUpdate("bob".into())]
        );
        assert_eq!(
            drain(&mut bob_rx),
            vec![ServerMessage::BuzzUpdate("bob".into())]
        );
    }

    #[tokio::test]
    async fn get_state_answers_the_requester_only() {
        let state = state();
        let (ada, mut ada_rx) = connect(&state, Some(player("ada")));
        let (_, mut bob_rx) = connect(&state, Some(player("bob")));

        dispatch(&state, ada, parse(r#"{"event":"getState"}"#)).await;

        assert!(matches!(
            drain(&mut ada_rx).as_slice(),
            [ServerMessage::RoundState(_)]
        ));
        assert!(drain(&mut bob_rx).is_empty());
    }

    #[tokio::test]
    async fn admin_scores_the_winner_over_the_socket() {
        let state = state();
        let (host, mut host_rx) = connect(&state, Some(admin()));
        let (ada, _ada_rx) = connect(&state, Some(player("ada")));

        for text in [
            r#"{"event":"selectQuestion","data":{"categoryIndex":0,"questionIndex":1}}"#,
            r#"{"event":"unlockBuzzers"}"#,
        ] {
            dispatch(&state, host, parse(text)).await;
        }
        dispatch(&state, ada, parse(r#"{"event":"buzz","data":null}"#)).await;
        drain(&mut host_rx);

        dispatch(
            &state,
            host,
            parse(r#"{"event":"answer","data":{"username":"ada","correct":false}}"#),
        )
        .await;

        match drain(&mut host_rx).as_slice() {
            [ServerMessage::ScoreUpdate(rows)] => {
                let ada = rows.iter().find(|row| row.username == "ada").unwrap();
                assert_eq!(ada.score, -200);
            }
            other => panic!("unexpected messages {other:?}"),
        }
    }
}
