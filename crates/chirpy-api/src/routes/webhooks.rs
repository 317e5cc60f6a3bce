//! Payment provider (Polka) webhook

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use chirpy_auth::WebhookAccess;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::types::WebhookRequest;

/// Event that upgrades a user to Chirpy Red
const USER_UPGRADED_EVENT: &str = "user.upgrade";

/// POST /api/polka/webhooks
///
/// The body is parsed only after the API key check, so callers without a
/// key learn nothing about the endpoint.
async fn polka_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    match state.webhook.check(&headers) {
        WebhookAccess::Granted => {}
        WebhookAccess::Hidden => return Ok(StatusCode::NO_CONTENT),
        WebhookAccess::Rejected => return Err(ApiError::Unauthorized),
    }

    let request: WebhookRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid webhook payload: {e}")))?;

    if request.event != USER_UPGRADED_EVENT {
        debug!("Ignoring webhook event: {}", request.event);
        return Ok(StatusCode::NO_CONTENT);
    }

    let user_id = request
        .data
        .user_id
        .ok_or_else(|| ApiError::BadRequest("Missing user_id".to_string()))?;

    if !state.db.upgrade_user(user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!("Upgraded user {} to Chirpy Red", user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// Create webhook routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/polka/webhooks", post(polka_webhook))
}
