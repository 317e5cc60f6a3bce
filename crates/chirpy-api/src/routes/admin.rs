//! Admin routes: hit metrics and the development reset

use axum::{
    Router,
    extract::State,
    middleware,
    response::Html,
    routing::{get, post},
};
use chirpy_auth::require_development;
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /admin/metrics
async fn admin_metrics(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        r#"<html>
  <body>
    <h1>Welcome, Chirpy Admin</h1>
    <p>Chirpy has been visited {} times!</p>
  </body>
</html>"#,
        state.hits.get()
    ))
}

/// POST /admin/reset (development platform only)
///
/// Resets the hit counter and deletes every user. The platform gate runs
/// as middleware, before this handler can touch any state.
async fn reset(State(state): State<AppState>) -> Result<String, ApiError> {
    state.hits.reset();
    let deleted = state.db.delete_all_users().await?;

    info!("Reset hit counter and deleted {} users", deleted);
    Ok("Hits reset to 0\nUsers deleted\n".to_string())
}

/// Create admin routes
pub fn routes(state: &AppState) -> Router<AppState> {
    let reset_route = Router::new()
        .route("/admin/reset", post(reset))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            require_development,
        ));

    Router::new()
        .route("/admin/metrics", get(admin_metrics))
        .merge(reset_route)
}
