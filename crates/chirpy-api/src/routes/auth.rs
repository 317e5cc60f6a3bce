//! Authentication extractors and routes

use axum::{
    Json, Router,
    extract::{FromRef, FromRequestParts, State},
    http::{HeaderMap, StatusCode, request::Parts},
    routing::post,
};
use chirpy_auth::{AuthError, AuthUser, bearer_token, verify_against_dummy, verify_password};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::{CredentialsRequest, LoginResponse, TokenResponse};
use super::users::{validate_email, validate_password};

// ==================== Auth Extractors ====================

/// Extractor for a user authenticated by a bearer access token
pub struct RequireAuth(pub AuthUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let user = AuthUser::authenticate(&parts.headers, &app_state.jwt)?;
        Ok(RequireAuth(user))
    }
}

// ==================== Auth Routes ====================

/// POST /api/login
async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    debug!("Login attempt for: {}", request.email);

    // Run a verification even for unknown emails so both paths take the
    // same time.
    let user = match state.db.get_user_by_email(&request.email).await? {
        Some(user) => user,
        None => {
            verify_against_dummy(&request.password);
            return Err(AuthError::Unauthorized.into());
        }
    };
    verify_password(&request.password, &user.password_hash)?;

    let token = state.jwt.issue(user.id)?;
    let refresh = state.refresh.issue(user.id).await?;

    metrics::counter!("chirpy_logins_total").increment(1);
    info!("User {} logged in", user.id);

    Ok(Json(LoginResponse {
        user: user.into(),
        token,
        refresh_token: refresh.token,
        expires_in: state.jwt.ttl().num_seconds(),
    }))
}

/// POST /api/refresh
///
/// Exchanges the bearer refresh token for a new access token.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, ApiError> {
    let refresh_token = bearer_token(&headers)?;
    let user_id = state.refresh.resolve(refresh_token).await?;
    let token = state.jwt.issue(user_id)?;

    debug!("Refreshed access token for user: {}", user_id);
    Ok(Json(TokenResponse { token }))
}

/// POST /api/revoke
///
/// Idempotent: revoking an unknown or already revoked token is answered
/// the same way as a successful revoke.
async fn revoke(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let refresh_token = bearer_token(&headers)?;

    match state.refresh.revoke(refresh_token).await {
        Ok(()) => {}
        Err(e @ (AuthError::NotFound | AuthError::AlreadyRevoked)) => {
            debug!("Revoke of a token that is no longer valid: {}", e);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Create auth routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/refresh", post(refresh))
        .route("/api/revoke", post(revoke))
}
