//! Request/Response DTOs

use chirpy_db::{Chirp, ChirpId, SortOrder, User, UserId};
use serde::{Deserialize, Serialize};

// ==================== Auth Types ====================

/// Credentials for registration, login and account updates
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Login response: the user plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Refresh response
#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

// ==================== User Types ====================

/// User response (without password)
#[derive(Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub created_at: String,
    pub updated_at: String,
    pub email: String,
    pub is_chirpy_red: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
            email: user.email,
            is_chirpy_red: user.is_chirpy_red,
        }
    }
}

/// User list response
#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

// ==================== Chirp Types ====================

/// Create chirp request
///
/// `user_id` is optional; when present it must match the caller.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateChirpRequest {
    pub body: String,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// Update or validate chirp request
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChirpBodyRequest {
    pub body: String,
}

/// Chirp response
#[derive(Serialize)]
pub struct ChirpResponse {
    pub id: ChirpId,
    pub created_at: String,
    pub updated_at: String,
    pub body: String,
    pub user_id: UserId,
}

impl From<Chirp> for ChirpResponse {
    fn from(chirp: Chirp) -> Self {
        Self {
            id: chirp.id,
            created_at: chirp.created_at.to_rfc3339(),
            updated_at: chirp.updated_at.to_rfc3339(),
            body: chirp.body,
            user_id: chirp.user_id,
        }
    }
}

/// Chirp list query parameters
#[derive(Deserialize, Default)]
pub struct ListChirpsQuery {
    pub author_id: Option<UserId>,
    #[serde(default)]
    pub sort: SortOrder,
}

/// Validate chirp response
#[derive(Serialize)]
pub struct CleanedChirpResponse {
    pub cleaned_body: String,
}

// ==================== Webhook Types ====================

/// Payment provider webhook payload
#[derive(Deserialize)]
pub struct WebhookRequest {
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

#[derive(Deserialize, Default)]
pub struct WebhookData {
    pub user_id: Option<UserId>,
}
