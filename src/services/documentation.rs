use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the buzzboard backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::auth::login,
        crate::routes::public::get_board,
        crate::routes::public::get_scores,
        crate::routes::public::get_round,
        crate::routes::admin::list_users,
        crate::routes::admin::create_user,
        crate::routes::admin::add_user,
        crate::routes::admin::update_user,
        crate::routes::admin::delete_user,
        crate::routes::admin::list_boards,
        crate::routes::admin::save_board,
        crate::routes::admin::save_legacy_board,
        crate::routes::admin::delete_board,
        crate::routes::admin::activate_board,
        crate::routes::sse::public_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::LoginRequest,
            crate::dto::common::LoginResponse,
            crate::dto::common::ScoreEntry,
            crate::dto::common::ErrorPayload,
            crate::dto::board::BoardView,
            crate::dto::board::QuestionView,
            crate::dto::board::BoardInput,
            crate::dto::phase::RoundStateView,
            crate::dto::admin::CreateUserRequest,
            crate::dto::admin::UpdateUserRequest,
            crate::dto::admin::UserSummary,
            crate::dto::admin::SaveBoardRequest,
            crate::dto::admin::BoardSummary,
            crate::dto::admin::ActionResponse,
            crate::dto::ws::SelectQuestionPayload,
            crate::dto::ws::AnswerPayload,
            crate::dto::sse::Handshake,
            crate::state::policy::Role,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login and session tokens"),
        (name = "public", description = "Read-only game projections"),
        (name = "admin", description = "User and board management"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "game", description = "WebSocket protocol for players and hosts"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/auth/login",
            "/public/board",
            "/public/scores",
            "/public/round",
            "/admin/users",
            "/admin/users/{username}",
            "/admin/addUser",
            "/admin/boards",
            "/admin/boards/{name}",
            "/admin/boards/{name}/activate",
            "/admin/saveBoard",
            "/sse/public",
            "/ws",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
