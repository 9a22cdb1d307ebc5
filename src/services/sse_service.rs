use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    state::{SharedState, SseHub},
};

const PUBLIC_STREAM: &str = "public";

/// Subscribe to the spectator stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            let event = Event::default().event(payload.event).data(payload.data);
                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "spectator stream lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!("public SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Announce a new spectator on the public stream.
pub fn broadcast_public_info(hub: &SseHub, message: &str) {
    let handshake = Handshake {
        stream: PUBLIC_STREAM.to_string(),
        message: message.to_string(),
    };
    match ServerEvent::json("info", &handshake) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(error = %err, "failed to encode spectator handshake"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dto::ws::ServerMessage, services::test_support::state};

    #[tokio::test]
    async fn spectators_receive_public_broadcasts() {
        let state = state();
        let mut receiver = subscribe_public(&state);

        broadcast_public_info(state.public_sse(), "public stream connected");
        state.gateway().broadcast(ServerMessage::TimerUpdate(12));

        let info = receiver.recv().await.unwrap();
        assert_eq!(info.event, "info");
        assert!(info.data.contains("public stream connected"));

        let tick = receiver.recv().await.unwrap();
        assert_eq!(tick.event, "timerUpdate");
        assert_eq!(tick.data, "12");
    }
}
