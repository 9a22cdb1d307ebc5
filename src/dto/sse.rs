use serde::Serialize;
use utoipa::ToSchema;

/// Named JSON payload pushed to spectators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerEvent {
    /// SSE event name, the same as the WebSocket event name.
    pub event: &'static str,
    /// JSON-encoded payload.
    pub data: String,
}

impl ServerEvent {
    /// Serialise `payload` into the data field of a named event.
    pub fn json<T: Serialize + ?Sized>(event: &'static str, payload: &T) -> serde_json::Result<Self> {
        Ok(Self {
            event,
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to a spectator when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
}
