//! Chirpy Authentication and Authorization
//!
//! This crate provides password hashing, JWT access tokens, revocable
//! refresh tokens, credential extraction from headers and the
//! authorization checks that bind a verified identity to a request.

pub mod error;
pub mod extract;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod refresh;

pub use error::{AuthError, AuthErrorKind};
pub use extract::{api_key, bearer_token};
pub use guard::{
    AuthUser, DeploymentGate, WebhookAccess, WebhookGuard, ensure_owner, require_development,
};
pub use jwt::{Claims, JwtManager};
pub use password::{hash_password, verify_against_dummy, verify_password};
pub use refresh::{IssuedRefreshToken, RefreshTokenService, RefreshTokenStore};
