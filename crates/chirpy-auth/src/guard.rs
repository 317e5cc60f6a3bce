//! Authorization decisions
//!
//! A protected operation moves through
//! `Unauthenticated -> TokenVerified -> Authorized | Denied`:
//! [`AuthUser::authenticate`] performs the first transition, and the
//! ownership, webhook and deployment checks below perform the second.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chirpy_db::UserId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::extract::{api_key, bearer_token};
use crate::jwt::JwtManager;

/// Platform value that unlocks development-only endpoints
pub const DEV_PLATFORM: &str = "dev";

/// Identity proven by a verified access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
}

impl AuthUser {
    /// Extract and verify the bearer access token in `headers`
    pub fn authenticate(headers: &HeaderMap, jwt: &JwtManager) -> Result<Self, AuthError> {
        let token = bearer_token(headers)?;
        let id = jwt.verify(token)?;

        debug!("Authenticated user: {}", id);
        Ok(Self { id })
    }

    /// Require this user to be the owner of a resource
    pub fn ensure_owns(&self, owner: UserId) -> Result<(), AuthError> {
        ensure_owner(self.id, owner)
    }
}

/// Require `actor` to be `owner`
///
/// Mismatch is `Forbidden`, never `NotFound`: the resource exists, it just
/// isn't the actor's.
pub fn ensure_owner(actor: UserId, owner: UserId) -> Result<(), AuthError> {
    if actor != owner {
        debug!("User {} denied access to resource owned by {}", actor, owner);
        return Err(AuthError::Forbidden);
    }
    Ok(())
}

/// Outcome of checking a webhook request's API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookAccess {
    /// Key matches the configured privileged key
    Granted,
    /// No key presented; answer as if the endpoint did not exist
    Hidden,
    /// A key was presented and it is wrong
    Rejected,
}

/// Guard for the privileged webhook endpoint
#[derive(Clone)]
pub struct WebhookGuard {
    key: String,
}

impl WebhookGuard {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Compare the presented API key byte-for-byte with the configured one
    pub fn check(&self, headers: &HeaderMap) -> WebhookAccess {
        match api_key(headers) {
            Ok(presented) if !self.key.is_empty() && presented.as_bytes() == self.key.as_bytes() => {
                WebhookAccess::Granted
            }
            Ok(_) | Err(AuthError::InvalidScheme) => {
                warn!("Webhook request with invalid API key");
                WebhookAccess::Rejected
            }
            Err(_) => WebhookAccess::Hidden,
        }
    }
}

/// Environment gate for development-only endpoints
///
/// This is not an identity check: no credential can open it outside the
/// development platform.
#[derive(Debug, Clone)]
pub struct DeploymentGate {
    platform: String,
}

impl DeploymentGate {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.platform == DEV_PLATFORM
    }

    pub fn ensure_development(&self) -> Result<(), AuthError> {
        if !self.is_development() {
            warn!("Development-only endpoint called on platform '{}'", self.platform);
            return Err(AuthError::Forbidden);
        }
        Ok(())
    }
}

/// Middleware that rejects the request before the handler runs unless
/// the deployment is a development one
pub async fn require_development(
    State(gate): State<DeploymentGate>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    gate.ensure_development()?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum::http::header::AUTHORIZATION;
    use chrono::Duration;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_authenticate() {
        let jwt = JwtManager::new("secret", Duration::hours(1));
        let id = UserId::new();
        let token = jwt.issue(id).unwrap();

        let user = AuthUser::authenticate(&headers(&format!("Bearer {token}")), &jwt).unwrap();
        assert_eq!(user.id, id);

        assert!(matches!(
            AuthUser::authenticate(&HeaderMap::new(), &jwt),
            Err(AuthError::MissingCredential)
        ));
        assert!(matches!(
            AuthUser::authenticate(&headers("Bearer not.a.token"), &jwt),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_ownership() {
        let alice = AuthUser { id: UserId::new() };
        let bob = UserId::new();

        assert!(alice.ensure_owns(alice.id).is_ok());
        assert!(matches!(alice.ensure_owns(bob), Err(AuthError::Forbidden)));
    }

    #[test]
    fn test_webhook_guard() {
        let guard = WebhookGuard::new("f271c81ff7084ee5b99a5091b42d486e");

        assert_eq!(
            guard.check(&headers("ApiKey f271c81ff7084ee5b99a5091b42d486e")),
            WebhookAccess::Granted
        );
        assert_eq!(guard.check(&HeaderMap::new()), WebhookAccess::Hidden);
        assert_eq!(guard.check(&headers("ApiKey ")), WebhookAccess::Hidden);
        assert_eq!(guard.check(&headers("ApiKey wrong")), WebhookAccess::Rejected);
        assert_eq!(
            guard.check(&headers("ApiKey F271C81FF7084EE5B99A5091B42D486E")),
            WebhookAccess::Rejected
        );
        assert_eq!(
            guard.check(&headers("Bearer f271c81ff7084ee5b99a5091b42d486e")),
            WebhookAccess::Rejected
        );
    }

    #[test]
    fn test_unconfigured_webhook_key_never_grants() {
        let guard = WebhookGuard::new("");
        assert_eq!(guard.check(&headers("ApiKey anything")), WebhookAccess::Rejected);
    }

    #[test]
    fn test_deployment_gate() {
        assert!(DeploymentGate::new("dev").ensure_development().is_ok());
        for platform in ["prod", "DEV", "", "development"] {
            assert!(matches!(
                DeploymentGate::new(platform).ensure_development(),
                Err(AuthError::Forbidden)
            ));
        }
    }
}
