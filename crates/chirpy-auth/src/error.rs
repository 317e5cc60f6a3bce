//! Authentication error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chirpy_db::DbError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing credential")]
    MissingCredential,

    #[error("Empty credential")]
    EmptyCredential,

    #[error("Invalid authorization scheme")]
    InvalidScheme,

    #[error("Malformed token")]
    Malformed,

    #[error("Token signature invalid")]
    SignatureInvalid,

    #[error("Token expired")]
    Expired,

    #[error("Token claims invalid: {0}")]
    ClaimsInvalid(String),

    #[error("Token subject invalid: {0}")]
    SubjectInvalid(String),

    #[error("Refresh token revoked")]
    Revoked,

    #[error("Refresh token already revoked")]
    AlreadyRevoked,

    #[error("Not found")]
    NotFound,

    #[error("Password does not match")]
    PasswordMismatch,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Refresh token collision")]
    StorageConflict,

    #[error("Password hashing error: {0}")]
    Hashing(String),

    #[error("Token signing error: {0}")]
    Signing(String),

    #[error("Token lifetime exceeds the representable time range")]
    LifetimeOverflow,

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

/// Coarse failure classes, as reported to handlers and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    InputMalformed,
    SignatureInvalid,
    Expired,
    Revoked,
    NotFound,
    Forbidden,
    Unauthorized,
    StorageConflict,
    HashingError,
    Internal,
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::MissingCredential
            | AuthError::EmptyCredential
            | AuthError::InvalidScheme
            | AuthError::Malformed
            | AuthError::ClaimsInvalid(_)
            | AuthError::SubjectInvalid(_) => AuthErrorKind::InputMalformed,
            AuthError::SignatureInvalid => AuthErrorKind::SignatureInvalid,
            AuthError::Expired => AuthErrorKind::Expired,
            AuthError::Revoked | AuthError::AlreadyRevoked => AuthErrorKind::Revoked,
            AuthError::NotFound => AuthErrorKind::NotFound,
            AuthError::Forbidden => AuthErrorKind::Forbidden,
            AuthError::PasswordMismatch | AuthError::Unauthorized => AuthErrorKind::Unauthorized,
            AuthError::StorageConflict => AuthErrorKind::StorageConflict,
            AuthError::Hashing(_) => AuthErrorKind::HashingError,
            AuthError::Signing(_) | AuthError::LifetimeOverflow | AuthError::Storage(_) => {
                AuthErrorKind::Internal
            }
        }
    }

    /// HTTP status for this failure
    ///
    /// Every credential problem collapses to 401 so callers cannot tell an
    /// expired token from a revoked or forged one.
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            AuthErrorKind::Forbidden => StatusCode::FORBIDDEN,
            AuthErrorKind::StorageConflict
            | AuthErrorKind::HashingError
            | AuthErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Message safe to show an unauthenticated caller
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            StatusCode::FORBIDDEN => "Forbidden",
            StatusCode::INTERNAL_SERVER_ERROR => "Something went wrong",
            _ => "Unauthorized",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = axum::Json(json!({
            "error": self.public_message()
        }));

        (self.status(), body).into_response()
    }
}
