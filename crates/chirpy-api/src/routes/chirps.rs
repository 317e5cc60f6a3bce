//! Chirp routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chirpy_auth::ensure_owner;
use chirpy_db::{Chirp, ChirpId, NewChirp};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequireAuth;
use super::types::{
    ChirpBodyRequest, ChirpResponse, CleanedChirpResponse, CreateChirpRequest, ListChirpsQuery,
};

/// Maximum chirp length in characters
const MAX_CHIRP_LENGTH: usize = 140;

/// Words replaced by `****`, matched case-insensitively
const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

/// Validate a chirp body and mask profanity
fn clean_body(body: &str) -> Result<String, ApiError> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("Chirp is empty".to_string()));
    }
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(ApiError::BadRequest("Chirp is too long".to_string()));
    }

    Ok(body
        .split(' ')
        .map(|word| {
            if PROFANE_WORDS.contains(&word.to_lowercase().as_str()) {
                "****"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" "))
}

/// Load a chirp or fail with 404
async fn find_chirp(state: &AppState, id: ChirpId) -> Result<Chirp, ApiError> {
    state
        .db
        .get_chirp(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chirp not found".to_string()))
}

// ==================== Chirp Routes ====================

/// POST /api/chirps (Authenticated)
async fn create_chirp(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Json(request): Json<CreateChirpRequest>,
) -> Result<(StatusCode, Json<ChirpResponse>), ApiError> {
    if let Some(claimed) = request.user_id {
        ensure_owner(auth.id, claimed)?;
    }
    let body = clean_body(&request.body)?;

    let chirp = state
        .db
        .insert_chirp(NewChirp {
            body,
            user_id: auth.id,
        })
        .await?;

    info!("User {} created chirp {}", auth.id, chirp.id);
    Ok((StatusCode::CREATED, Json(chirp.into())))
}

/// GET /api/chirps?author_id=&sort=asc|desc
async fn list_chirps(
    State(state): State<AppState>,
    Query(query): Query<ListChirpsQuery>,
) -> Result<Json<Vec<ChirpResponse>>, ApiError> {
    let chirps = state.db.list_chirps(query.author_id, query.sort).await?;
    Ok(Json(chirps.into_iter().map(ChirpResponse::from).collect()))
}

/// GET /api/chirps/{id}
async fn get_chirp(
    State(state): State<AppState>,
    Path(id): Path<ChirpId>,
) -> Result<Json<ChirpResponse>, ApiError> {
    Ok(Json(find_chirp(&state, id).await?.into()))
}

/// PUT /api/chirps/{id} (Authenticated, owner only)
async fn update_chirp(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ChirpId>,
    Json(request): Json<ChirpBodyRequest>,
) -> Result<Json<ChirpResponse>, ApiError> {
    let chirp = find_chirp(&state, id).await?;
    auth.ensure_owns(chirp.user_id)?;
    let body = clean_body(&request.body)?;

    let chirp = state
        .db
        .update_chirp(id, &body)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chirp not found".to_string()))?;

    debug!("User {} updated chirp {}", auth.id, id);
    Ok(Json(chirp.into()))
}

/// DELETE /api/chirps/{id} (Authenticated, owner only)
async fn delete_chirp(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<ChirpId>,
) -> Result<StatusCode, ApiError> {
    let chirp = find_chirp(&state, id).await?;
    auth.ensure_owns(chirp.user_id)?;

    if !state.db.delete_chirp(id).await? {
        return Err(ApiError::NotFound("Chirp not found".to_string()));
    }

    info!("User {} deleted chirp {}", auth.id, id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/validate_chirp
async fn validate_chirp(
    Json(request): Json<ChirpBodyRequest>,
) -> Result<Json<CleanedChirpResponse>, ApiError> {
    Ok(Json(CleanedChirpResponse {
        cleaned_body: clean_body(&request.body)?,
    }))
}

/// Create chirp routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/chirps", get(list_chirps).post(create_chirp))
        .route(
            "/api/chirps/{id}",
            get(get_chirp).put(update_chirp).delete(delete_chirp),
        )
        .route("/api/validate_chirp", post(validate_chirp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_body_masks_profanity() {
        assert_eq!(
            clean_body("This is a kerfuffle opinion I need to share with the world").unwrap(),
            "This is a **** opinion I need to share with the world"
        );
        assert_eq!(
            clean_body("I hear Mastodon is better than Chirpy. sharbert I need to migrate")
                .unwrap(),
            "I hear Mastodon is better than Chirpy. **** I need to migrate"
        );
        assert_eq!(clean_body("Fornax!").unwrap(), "Fornax!");
        assert_eq!(clean_body("FORNAX fornax").unwrap(), "**** ****");
    }

    #[test]
    fn test_clean_body_length_limits() {
        assert!(clean_body("").is_err());
        assert!(clean_body(&"a".repeat(140)).is_ok());
        assert!(clean_body(&"a".repeat(141)).is_err());
        // Length is counted in characters, not bytes
        assert!(clean_body(&"é".repeat(140)).is_ok());
    }
}
