use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::state::{
    registry::RegistryError, round::RoundError, state_machine::InvalidTransition,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The actor's role does not allow the requested action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// No identity is attached to the request or connection.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// Board coordinates are out of range, or no question/board is active.
    #[error("invalid selection: {0}")]
    InvalidSelection(String),
    /// Operation cannot be performed in the current phase.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A resource with the same key already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ServiceError {
    /// Stable camel-case name reported to WebSocket clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::PermissionDenied(_) => "permissionDenied",
            ServiceError::Unauthenticated(_) => "unauthenticated",
            ServiceError::InvalidSelection(_) => "invalidSelection",
            ServiceError::InvalidState(_) => "invalidState",
            ServiceError::InvalidInput(_) => "invalidInput",
            ServiceError::AlreadyExists(_) => "alreadyExists",
            ServiceError::NotFound(_) => "notFound",
        }
    }
}

impl From<InvalidTransition> for ServiceError {
    fn from(err: InvalidTransition) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<RoundError> for ServiceError {
    fn from(err: RoundError) -> Self {
        match err {
            RoundError::Transition(invalid) => invalid.into(),
            RoundError::NoActiveQuestion
            | RoundError::NotAnswerable { .. }
            | RoundError::AlreadyAnswered { .. } => ServiceError::InvalidSelection(err.to_string()),
        }
    }
}

impl From<RegistryError> for ServiceError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AlreadyExists(_) => ServiceError::AlreadyExists(err.to_string()),
            RegistryError::NotFound(_) => ServiceError::NotFound(err.to_string()),
            RegistryError::ScoreOverflow(_) => ServiceError::InvalidState(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Missing or unknown session token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Authenticated but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::PermissionDenied(message) => AppError::Forbidden(message),
            ServiceError::Unauthenticated(message) => AppError::Unauthorized(message),
            ServiceError::InvalidSelection(message) | ServiceError::InvalidInput(message) => {
                AppError::BadRequest(message)
            }
            ServiceError::InvalidState(message) | ServiceError::AlreadyExists(message) => {
                AppError::Conflict(message)
            }
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
