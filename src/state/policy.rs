//! Role model and the single permission policy consulted by every
//! state-mutating operation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ServiceError;

/// Closed set of roles a user can hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Runs the game: selects questions, drives the timer, manages users.
    Admin,
    /// Maintains board content but cannot run rounds.
    Editor,
    /// Buzzes and answers.
    #[default]
    Player,
}

/// Authenticated actor as resolved by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Login name.
    pub username: String,
    /// Role at the time the identity was issued.
    pub role: Role,
}

impl Identity {
    /// Build an identity from its parts.
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Operations subject to the permission policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// Pick the active question.
    SelectQuestion,
    /// Start or restart the countdown.
    StartTimer,
    /// Allow buzzing without starting the countdown.
    UnlockBuzzers,
    /// Dismiss the active question and return to idle.
    CloseQuestion,
    /// Signal a buzz for the current question.
    Buzz,
    /// Report a verdict for the named player's answer.
    Answer {
        /// Player whose answer is being scored.
        responder: &'a str,
    },
    /// State whether an answer is correct instead of having it judged.
    DeclareVerdict,
    /// Create, update, or delete users.
    ManageUsers,
    /// Create, update, or delete boards.
    EditBoards,
    /// Switch the live board.
    ActivateBoard,
    /// See expected answers on boards and selected questions.
    ViewAnswers,
}

/// Decide whether `actor` may perform `action`.
pub fn authorize(actor: &Identity, action: Action<'_>) -> Result<(), ServiceError> {
    let allowed = match action {
        Action::SelectQuestion
        | Action::StartTimer
        | Action::UnlockBuzzers
        | Action::CloseQuestion
        | Action::DeclareVerdict
        | Action::ManageUsers
        | Action::ActivateBoard => actor.role == Role::Admin,
        Action::EditBoards | Action::ViewAnswers => {
            matches!(actor.role, Role::Admin | Role::Editor)
        }
        Action::Buzz => true,
        Action::Answer { responder } => actor.role == Role::Admin || actor.username == responder,
    };

    if allowed {
        Ok(())
    } else {
        Err(ServiceError::PermissionDenied(format!(
            "{:?} may not perform {action:?}",
            actor.role
        )))
    }
}

/// Convenience check for read paths that only tailor output.
pub fn can_view_answers(role: Role) -> bool {
    matches!(role, Role::Admin | Role::Editor)
}
