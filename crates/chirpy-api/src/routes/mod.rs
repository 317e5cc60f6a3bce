//! API routes

mod admin;
mod auth;
mod chirps;
mod health;
pub mod metrics;
mod types;
mod users;
mod webhooks;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;

use crate::state::{AppState, HitCounter, MetricsHandle};

/// Count every request for the static file server, found or not
async fn count_hits(State(hits): State<HitCounter>, request: Request, next: Next) -> Response {
    hits.increment();
    ::metrics::counter!("chirpy_http_hits_total").increment(1);
    next.run(request).await
}

/// Create the main router
///
/// Static files under `static_dir` are served on `/app`.
pub fn create_router(
    state: AppState,
    static_dir: impl AsRef<Path>,
    metrics_handle: Option<Arc<MetricsHandle>>,
) -> Router {
    let file_server = ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(state.hits.clone(), count_hits))
        .service(ServeDir::new(static_dir));

    let mut router = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(users::routes())
        .merge(chirps::routes())
        .merge(webhooks::routes())
        .merge(admin::routes(&state))
        .nest_service("/app", file_server)
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}
