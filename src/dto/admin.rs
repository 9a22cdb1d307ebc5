//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dto::{
        board::BoardInput,
        validation::{validate_board_name, validate_username},
    },
    state::{
        board::Board,
        policy::Role,
        registry::{Player, PlayerUpdate},
    },
};

/// Request creating a user, also accepted by the legacy `/admin/addUser`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_username(&self.username) {
            errors.add("username", e);
        }
        if let Err(e) = validate_password(&self.password) {
            errors.add("password", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<CreateUserRequest> for Player {
    fn from(request: CreateUserRequest) -> Self {
        Self {
            username: request.username,
            password: request.password,
            role: request.role,
            score: 0,
        }
    }
}

/// Partial update of an existing user. Absent fields are left untouched.
/// Scores are not editable here; only answers change them.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref password) = self.password {
            if let Err(e) = validate_password(password) {
                errors.add("password", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<UpdateUserRequest> for PlayerUpdate {
    fn from(request: UpdateUserRequest) -> Self {
        Self {
            password: request.password,
            role: request.role,
        }
    }
}

/// User as listed for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserSummary {
    pub username: String,
    pub role: Role,
    pub score: i64,
}

impl From<&Player> for UserSummary {
    fn from(player: &Player) -> Self {
        Self {
            username: player.username.clone(),
            role: player.role,
            score: player.score,
        }
    }
}

/// Request storing a named board.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SaveBoardRequest {
    pub name: String,
    pub board: BoardInput,
}

impl Validate for SaveBoardRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_board_name(&self.name) {
            errors.add("name", e);
        }
        if let Err(board_errors) = self.board.validate() {
            errors.merge_self("board", Err(board_errors));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Board as listed for administrators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BoardSummary {
    pub name: String,
    pub active: bool,
    pub categories: usize,
    pub questions: usize,
    pub multiplier: i64,
}

impl BoardSummary {
    /// Summarise a stored board.
    pub fn new(name: &str, board: &Board, active: bool) -> Self {
        Self {
            name: name.to_string(),
            active,
            categories: board.categories.len(),
            questions: board.question_count(),
            multiplier: board.multiplier,
        }
    }
}

/// Generic action acknowledgement used by admin endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    /// Wrap a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        let mut err = ValidationError::new("password_empty");
        err.message = Some("Password must not be empty".into());
        return Err(err);
    }
    Ok(())
}
