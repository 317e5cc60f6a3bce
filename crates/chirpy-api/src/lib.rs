//! Chirpy REST API
//!
//! This crate provides the Axum-based HTTP API for Chirpy: accounts,
//! login and token refresh, chirps, the payment webhook and the admin
//! endpoints.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::{AppState, AuthSettings, HitCounter, MetricsHandle};
