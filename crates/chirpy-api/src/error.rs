//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] chirpy_db::DbError),

    #[error("Auth error: {0}")]
    Auth(#[from] chirpy_auth::AuthError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".to_string(),
                )
            }
            ApiError::Auth(e) => {
                // Keep the precise kind in the logs; the caller only gets the
                // generic message.
                metrics::counter!("chirpy_auth_failures_total").increment(1);
                if e.status() == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("Auth failure ({:?}): {}", e.kind(), e);
                } else {
                    debug!("Auth failure ({:?}): {}", e.kind(), e);
                }
                (e.status(), e.public_message().to_string())
            }
        };

        let body = axum::Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
