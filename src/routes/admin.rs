use axum::{
    Extension, Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
};
use validator::Validate;

use crate::{
    dto::{
        admin::{
            ActionResponse, BoardSummary, CreateUserRequest, SaveBoardRequest, UpdateUserRequest,
            UserSummary,
        },
        board::BoardInput,
    },
    error::AppError,
    services::{admin_service, auth_service},
    state::{SharedState, policy::Identity},
};

const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// Token-protected user and board management endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/addUser", post(add_user))
        .route(
            "/admin/users/{username}",
            put(update_user).delete(delete_user),
        )
        .route("/admin/boards", get(list_boards).post(save_board))
        .route("/admin/saveBoard", post(save_legacy_board))
        .route("/admin/boards/{name}", delete(delete_board))
        .route("/admin/boards/{name}/activate", post(activate_board))
        .route_layer(middleware::from_fn_with_state(state, require_session_token))
}

/// List every registered user.
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login")),
    responses(
        (status = 200, description = "Registered users", body = [UserSummary]),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_users(
    State(state): State<SharedState>,
    Extension(actor): Extension<Identity>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    Ok(Json(admin_service::list_users(&state, &actor).await?))
}

/// Register a new user.
#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login")),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserSummary),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn create_user(
    State(state): State<SharedState>,
    Extension(actor): Extension<Identity>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    payload.validate()?;
    let user = admin_service::create_user(&state, &actor, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Legacy alias of `POST /admin/users`.
#[utoipa::path(
    post,
    path = "/admin/addUser",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login")),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserSummary),
        (status = 409, description = "Username already taken")
    )
)]
pub async fn add_user(
    state: State<SharedState>,
    actor: Extension<Identity>,
    payload: Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserSummary>), AppError> {
    create_user(state, actor, payload).await
}

/// Change the password or role of a user.
#[utoipa::path(
    put,
    path = "/admin/users/{username}",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login"),
    ("username" = String, Path, description = "User to update")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserSummary),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn update_user(
    State(state): State<SharedState>,
    Extension(actor): Extension<Identity>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        admin_service::update_user(&state, &actor, &username, payload).await?,
    ))
}

/// Delete a user. Refused while a question is open.
#[utoipa::path(
    delete,
    path = "/admin/users/{username}",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login"),
    ("username" = String, Path, description = "User to delete")),
    responses(
        (status = 200, description = "User deleted", body = ActionResponse),
        (status = 404, description = "Unknown user"),
        (status = 409, description = "A question is open")
    )
)]
pub async fn delete_user(
    State(state): State<SharedState>,
    Extension(actor): Extension<Identity>,
    Path(username): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(
        admin_service::delete_user(&state, &actor, &username).await?,
    ))
}

/// List every stored board.
#[utoipa::path(
    get,
    path = "/admin/boards",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login")),
    responses((status = 200, description = "Stored boards", body = [BoardSummary]))
)]
pub async fn list_boards(
    State(state): State<SharedState>,
    Extension(actor): Extension<Identity>,
) -> Result<Json<Vec<BoardSummary>>, AppError> {
    Ok(Json(admin_service::list_boards(&state, &actor).await?))
}

/// Create or replace a named board.
#[utoipa::path(
    post,
    path = "/admin/boards",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login")),
    request_body = SaveBoardRequest,
    responses(
        (status = 200, description = "Board stored", body = BoardSummary),
        (status = 400, description = "Invalid board")
    )
)]
pub async fn save_board(
    State(state): State<SharedState>,
    Extension(actor): Extension<Identity>,
    Json(payload): Json<SaveBoardRequest>,
) -> Result<Json<BoardSummary>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::save_board(&state, &actor, payload).await?))
}

/// Legacy single-board save: stores the board as `default` and activates it.
#[utoipa::path(
    post,
    path = "/admin/saveBoard",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login")),
    request_body = BoardInput,
    responses(
        (status = 200, description = "Board stored and live", body = BoardSummary),
        (status = 400, description = "Invalid board")
    )
)]
pub async fn save_legacy_board(
    State(state): State<SharedState>,
    Extension(actor): Extension<Identity>,
    Json(payload): Json<BoardInput>,
) -> Result<Json<BoardSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        admin_service::save_legacy_board(&state, &actor, payload).await?,
    ))
}

/// Delete a board that is not live.
#[utoipa::path(
    delete,
    path = "/admin/boards/{name}",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login"),
    ("name" = String, Path, description = "Board to delete")),
    responses(
        (status = 200, description = "Board deleted", body = ActionResponse),
        (status = 404, description = "Unknown board"),
        (status = 409, description = "Board is live")
    )
)]
pub async fn delete_board(
    State(state): State<SharedState>,
    Extension(actor): Extension<Identity>,
    Path(name): Path<String>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::delete_board(&state, &actor, &name).await?))
}

/// Make a board live and reset the round.
#[utoipa::path(
    post,
    path = "/admin/boards/{name}/activate",
    tag = "admin",
    params(("x-session-token" = String, Header, description = "Session token returned by /auth/login"),
    ("name" = String, Path, description = "Board to activate")),
    responses(
        (status = 200, description = "Board activated", body = BoardSummary),
        (status = 404, description = "Unknown board")
    )
)]
pub async fn activate_board(
    State(state): State<SharedState>,
    Extension(actor): Extension<Identity>,
    Path(name): Path<String>,
) -> Result<Json<BoardSummary>, AppError> {
    Ok(Json(
        admin_service::activate_board(&state, &actor, &name).await?,
    ))
}

async fn require_session_token(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(SESSION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing session token header `x-session-token`".into())
        })?;

    let identity = auth_service::authenticate_token(&state, provided)?;
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
