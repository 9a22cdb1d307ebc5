//! Password login and session tokens.

use tracing::{info, warn};

use crate::{
    dto::common::{LoginRequest, LoginResponse},
    error::ServiceError,
    state::{SharedState, policy::Identity},
};

/// Check credentials against the registry and issue a session token.
pub async fn login(
    state: &SharedState,
    request: &LoginRequest,
) -> Result<(Identity, LoginResponse), ServiceError> {
    let session = state.session().lock().await;
    let Some(player) = session
        .registry()
        .authenticate(&request.username, &request.password)
    else {
        warn!(username = %request.username, "login rejected");
        return Err(ServiceError::Unauthenticated("invalid credentials".into()));
    };

    let identity = Identity::new(player.username.clone(), player.role);
    let token = state.issue_token(identity.clone());
    info!(username = %identity.username, role = ?identity.role, "login succeeded");

    Ok((
        identity,
        LoginResponse {
            username: player.username.clone(),
            score: player.score,
            role: player.role,
            token,
        },
    ))
}

/// Resolve an `x-session-token` header value.
pub fn authenticate_token(state: &SharedState, token: &str) -> Result<Identity, ServiceError> {
    state
        .resolve_token(token)
        .ok_or_else(|| ServiceError::Unauthenticated("unknown or revoked session token".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{services::test_support::state, state::policy::Role};

    fn credentials(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_issues_a_resolvable_token() {
        let state = state();
        let (identity, response) = login(&state, &credentials("host", "secret")).await.unwrap();
        assert_eq!(identity, Identity::new("host", Role::Admin));
        assert_eq!(response.role, Role::Admin);
        assert_eq!(authenticate_token(&state, &response.token).unwrap(), identity);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthenticated() {
        let state = state();
        let err = login(&state, &credentials("ada", "nope")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthenticated(ref message) if message == "invalid credentials"));
        assert!(login(&state, &credentials("ghost", "secret")).await.is_err());
    }

    #[tokio::test]
    async fn revoked_tokens_stop_resolving() {
        let state = state();
        let (_, response) = login(&state, &credentials("ada", "secret")).await.unwrap();
        state.revoke_user("ada");
        assert!(matches!(
            authenticate_token(&state, &response.token),
            Err(ServiceError::Unauthenticated(_))
        ));
    }
}
