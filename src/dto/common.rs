use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::ServiceError,
    state::{policy::Role, registry::Player},
};

/// Scoreboard row. Credentials never leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScoreEntry {
    pub username: String,
    pub role: Role,
    pub score: i64,
}

impl From<&Player> for ScoreEntry {
    fn from(player: &Player) -> Self {
        Self {
            username: player.username.clone(),
            role: player.role,
            score: player.score,
        }
    }
}

/// Credentials submitted on login.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Identity returned after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LoginResponse {
    pub username: String,
    pub score: i64,
    pub role: Role,
    /// Session token to send as `x-session-token` on admin routes.
    pub token: String,
}

/// Error reported to the originating WebSocket connection only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorPayload {
    /// Stable error category, e.g. `permissionDenied`.
    pub kind: String,
    pub message: String,
}

impl From<&ServiceError> for ErrorPayload {
    fn from(err: &ServiceError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
