//! User account routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use chirpy_auth::hash_password;
use chirpy_db::{DbError, NewUser, UserId};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{CredentialsRequest, UserResponse, UsersResponse};

// ==================== Input Validation ====================

/// Maximum allowed email length
const MAX_EMAIL_LENGTH: usize = 254;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;

/// Validate email shape and length
pub(super) fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email exceeds maximum length of {} characters",
            MAX_EMAIL_LENGTH
        )));
    }
    if !email.contains('@') {
        return Err(ApiError::BadRequest("Email is invalid".to_string()));
    }
    Ok(())
}

/// Validate password length
pub(super) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Registration and email changes must not reveal which emails exist
fn hide_duplicate(err: DbError) -> ApiError {
    match err {
        DbError::Duplicate(_) => ApiError::BadRequest("Could not save user".to_string()),
        e => e.into(),
    }
}

// ==================== User Routes ====================

/// POST /api/users
async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .db
        .insert_user(NewUser {
            email: request.email,
            password_hash,
        })
        .await
        .map_err(hide_duplicate)?;

    info!("Created user: {}", user.id);
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /api/users (Authenticated, acts on the caller's own account)
async fn update_user(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    validate_email(&request.email)?;
    validate_password(&request.password)?;

    let password_hash = hash_password(&request.password)?;
    let user = state
        .db
        .update_user_credentials(auth.id, &request.email, &password_hash)
        .await
        .map_err(hide_duplicate)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!("Updated user: {}", user.id);
    Ok(Json(user.into()))
}

/// GET /api/users
async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.db.list_users().await?;

    Ok(Json(UsersResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .db
        .get_user_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

/// DELETE /api/users/{id} (Authenticated, own account only)
///
/// Refresh tokens and chirps are removed with the account.
async fn delete_user(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<StatusCode, ApiError> {
    auth.ensure_owns(id)?;

    debug!("Deleting user: {}", id);
    if !state.db.delete_user(id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!("Deleted user: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Create user routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/users",
            get(list_users).post(create_user).put(update_user),
        )
        .route("/api/users/{id}", get(get_user).delete(delete_user))
}
