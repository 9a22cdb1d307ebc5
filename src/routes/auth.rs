use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::common::{LoginRequest, LoginResponse},
    error::AppError,
    services::auth_service,
    state::SharedState,
};

/// Authentication endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/auth/login", post(login))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
/// Exchange credentials for a session token.
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (_, response) = auth_service::login(&state, &payload).await?;
    Ok(Json(response))
}
