//! Envelope exchanged over `/ws`: `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::dto::{
    board::{BoardView, QuestionView},
    common::{ErrorPayload, LoginRequest, LoginResponse, ScoreEntry},
    phase::RoundStateView,
    sse::ServerEvent,
};

/// Messages accepted from WebSocket clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    Login(LoginRequest),
    GetBoard,
    GetState,
    SelectQuestion(SelectQuestionPayload),
    StartTimer,
    UnlockBuzzers,
    CloseQuestion,
    /// The optional username is ignored; the connection's identity buzzes.
    Buzz(Option<String>),
    Answer(AnswerPayload),
    GetScores,
}

impl ClientMessage {
    /// Parse a text frame.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Coordinates of the question to show.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectQuestionPayload {
    pub category_index: usize,
    pub question_index: usize,
    /// Legacy client flag; authorization uses the connection's role.
    #[serde(default)]
    pub admin: Option<bool>,
}

/// Verdict or raw response for one player's answer.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnswerPayload {
    /// Player being scored; defaults to the sender.
    #[serde(default)]
    pub username: Option<String>,
    /// Declared outcome, accepted from admins only.
    #[serde(default)]
    pub correct: Option<bool>,
    /// Raw response judged against the expected answer.
    #[serde(default)]
    pub response: Option<String>,
}

/// Messages pushed to WebSocket clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    LoginSuccess(LoginResponse),
    LoginFail(String),
    BoardData(BoardView),
    QuestionSelected(QuestionView),
    /// Seconds left after a tick.
    TimerUpdate(u32),
    TimerEnded,
    BuzzersUnlocked,
    /// Username of the buzz winner.
    BuzzUpdate(String),
    QuestionClosed,
    ScoreUpdate(Vec<ScoreEntry>),
    RoundState(RoundStateView),
    Error(ErrorPayload),
}

impl ServerMessage {
    /// Event name as it appears on the wire.
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::LoginSuccess(_) => "loginSuccess",
            ServerMessage::LoginFail(_) => "loginFail",
            ServerMessage::BoardData(_) => "boardData",
            ServerMessage::QuestionSelected(_) => "questionSelected",
            ServerMessage::TimerUpdate(_) => "timerUpdate",
            ServerMessage::TimerEnded => "timerEnded",
            ServerMessage::BuzzersUnlocked => "buzzersUnlocked",
            ServerMessage::BuzzUpdate(_) => "buzzUpdate",
            ServerMessage::QuestionClosed => "questionClosed",
            ServerMessage::ScoreUpdate(_) => "scoreUpdate",
            ServerMessage::RoundState(_) => "roundState",
            ServerMessage::Error(_) => "error",
        }
    }

    /// Serialize the full envelope for a text frame.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Mirror the message onto an SSE event: the event name becomes the SSE
    /// event and the payload its data.
    pub fn to_sse_event(&self) -> serde_json::Result<ServerEvent> {
        let mut envelope = serde_json::to_value(self)?;
        let data = envelope
            .get_mut("data")
            .map(Value::take)
            .unwrap_or(Value::Null);
        ServerEvent::json(self.event_name(), &data)
    }
}
