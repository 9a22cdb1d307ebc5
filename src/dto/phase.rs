use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::board::QuestionView,
    state::{session::RoundSnapshot, state_machine::RoundPhase},
};

/// Round phase exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VisibleRoundPhase {
    /// No question is shown.
    Idle,
    /// Question shown, buzzing closed.
    QuestionShown,
    /// Buzzing open.
    BuzzOpen,
    /// Countdown ran out without a buzz.
    Expired,
    /// Waiting for the buzz winner's answer.
    AwaitingAnswer,
}

impl From<&RoundPhase> for VisibleRoundPhase {
    fn from(value: &RoundPhase) -> Self {
        match value {
            RoundPhase::Idle => VisibleRoundPhase::Idle,
            RoundPhase::QuestionShown => VisibleRoundPhase::QuestionShown,
            RoundPhase::BuzzOpen => VisibleRoundPhase::BuzzOpen,
            RoundPhase::Expired => VisibleRoundPhase::Expired,
            RoundPhase::AwaitingAnswer { .. } => VisibleRoundPhase::AwaitingAnswer,
        }
    }
}

/// Payload of `roundState` and `GET /public/round`.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundStateView {
    pub phase: VisibleRoundPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    pub remaining_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buzz_winner: Option<String>,
    pub buzz_locked: bool,
}

impl RoundStateView {
    /// Project a snapshot, keeping the answer only when requested.
    pub fn from_snapshot(snapshot: &RoundSnapshot, include_answer: bool) -> Self {
        Self {
            phase: (&snapshot.phase).into(),
            question: snapshot
                .question
                .as_ref()
                .map(|question| QuestionView::from_active(question, include_answer)),
            remaining_seconds: snapshot.remaining_seconds,
            buzz_winner: snapshot.buzz_winner.clone(),
            buzz_locked: snapshot.buzz_locked,
        }
    }
}
