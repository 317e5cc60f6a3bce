//! Refresh token issuance, resolution and revocation
//!
//! Refresh tokens are opaque random strings resolved against storage on
//! every use, so they can be revoked before they expire.

use async_trait::async_trait;
use chirpy_db::{Database, DbError, NewRefreshToken, RefreshToken, UserId};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AuthError;

/// Bytes of entropy per token (hex-encoded to twice as many characters)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Default refresh token lifetime
pub const DEFAULT_REFRESH_TOKEN_TTL_DAYS: i64 = 60;

/// Row-level storage primitives needed by [`RefreshTokenService`]
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Insert a new token; a duplicate value must surface as `DbError::Duplicate`
    async fn insert(&self, token: NewRefreshToken) -> Result<RefreshToken, DbError>;

    /// Find a token by value
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DbError>;

    /// Atomically revoke a live token, returning whether a row changed
    async fn mark_revoked(&self, token: &str, now: DateTime<Utc>) -> Result<bool, DbError>;
}

#[async_trait]
impl RefreshTokenStore for Database {
    async fn insert(&self, token: NewRefreshToken) -> Result<RefreshToken, DbError> {
        self.insert_refresh_token(token).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DbError> {
        self.get_refresh_token(token).await
    }

    async fn mark_revoked(&self, token: &str, now: DateTime<Utc>) -> Result<bool, DbError> {
        self.revoke_refresh_token(token, now).await
    }
}

/// Generate a new token value: 256 random bits as 64 lowercase hex chars
pub fn generate_refresh_token() -> Result<String, AuthError> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Hashing(format!("entropy source failure: {e}")))?;
    Ok(hex::encode(bytes))
}

/// A freshly issued refresh token and its stored record
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub record: RefreshToken,
}

/// Refresh token service
#[derive(Clone)]
pub struct RefreshTokenService {
    store: Arc<dyn RefreshTokenStore>,
    ttl: Duration,
}

impl RefreshTokenService {
    pub fn new(store: Arc<dyn RefreshTokenStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Lifetime of issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a refresh token bound to `user_id`
    pub async fn issue(&self, user_id: UserId) -> Result<IssuedRefreshToken, AuthError> {
        self.issue_at(user_id, Utc::now()).await
    }

    /// Issue a refresh token as if the current time were `now`
    ///
    /// A token value collision is retried once with a new value, then
    /// reported as `StorageConflict`.
    pub async fn issue_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<IssuedRefreshToken, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::LifetimeOverflow)?;

        let mut retried = false;
        loop {
            let new_token = NewRefreshToken {
                token: generate_refresh_token()?,
                user_id,
                created_at: now,
                expires_at,
            };

            match self.store.insert(new_token).await {
                Ok(record) => {
                    debug!("Issued refresh token for user: {}", user_id);
                    return Ok(IssuedRefreshToken {
                        token: record.token.clone(),
                        record,
                    });
                }
                Err(DbError::Duplicate(_)) if !retried => {
                    warn!("Refresh token collision, regenerating");
                    retried = true;
                }
                Err(DbError::Duplicate(_)) => return Err(AuthError::StorageConflict),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Resolve a refresh token to the user it is bound to
    pub async fn resolve(&self, token: &str) -> Result<UserId, AuthError> {
        self.resolve_at(token, Utc::now()).await
    }

    /// Resolve a refresh token as if the current time were `now`
    ///
    /// Never extends or otherwise touches the stored record.
    pub async fn resolve_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        let record = self
            .store
            .find_by_token(token)
            .await?
            .ok_or(AuthError::NotFound)?;

        if record.revoked_at.is_some() {
            return Err(AuthError::Revoked);
        }
        if now >= record.expires_at {
            return Err(AuthError::Expired);
        }
        Ok(record.user_id)
    }

    /// Revoke a refresh token
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.revoke_at(token, Utc::now()).await
    }

    /// Revoke a refresh token as if the current time were `now`
    ///
    /// Reports `NotFound` for unknown tokens and `AlreadyRevoked` when the
    /// token was revoked earlier; neither changes any state.
    pub async fn revoke_at(&self, token: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        if self.store.mark_revoked(token, now).await? {
            debug!("Revoked refresh token");
            return Ok(());
        }

        match self.store.find_by_token(token).await? {
            Some(_) => Err(AuthError::AlreadyRevoked),
            None => Err(AuthError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirpy_db::NewUser;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn setup() -> (RefreshTokenService, Database, UserId) {
        let db = Database::in_memory().await.unwrap();
        let user = db
            .insert_user(NewUser {
                email: "a@b.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let service = RefreshTokenService::new(
            Arc::new(db.clone()),
            Duration::days(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
        );
        (service, db, user.id)
    }

    #[test]
    fn test_generated_tokens_are_64_hex_chars() {
        let a = generate_refresh_token().unwrap();
        let b = generate_refresh_token().unwrap();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let (service, _, user_id) = setup().await;
        let issued = service.issue(user_id).await.unwrap();

        assert_eq!(issued.token.len(), 64);
        assert_eq!(issued.record.user_id, user_id);
        assert_eq!(
            issued.record.expires_at - issued.record.created_at,
            Duration::days(60)
        );
        assert!(issued.record.revoked_at.is_none());
        assert_eq!(service.resolve(&issued.token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_resolve_does_not_slide_expiry() {
        let (service, db, user_id) = setup().await;
        let issued = service.issue(user_id).await.unwrap();
        let before = db.get_refresh_token(&issued.token).await.unwrap().unwrap();

        service.resolve(&issued.token).await.unwrap();
        service.resolve(&issued.token).await.unwrap();

        let after = db.get_refresh_token(&issued.token).await.unwrap().unwrap();
        assert_eq!(before.expires_at, after.expires_at);
        assert_eq!(before.updated_at, after.updated_at);
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_an_error() {
        let (_, db, user_id) = setup().await;
        let service = RefreshTokenService::new(Arc::new(db), Duration::days(100_000_000));

        assert!(matches!(
            service.issue(user_id).await,
            Err(AuthError::LifetimeOverflow)
        ));
    }

    #[tokio::test]
    async fn test_unknown_token() {
        let (service, _, _) = setup().await;
        assert!(matches!(
            service.resolve(&"0".repeat(64)).await,
            Err(AuthError::NotFound)
        ));
        assert!(matches!(
            service.revoke(&"0".repeat(64)).await,
            Err(AuthError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_expired_token() {
        let (service, _, user_id) = setup().await;
        let issued_at = Utc::now() - Duration::days(61);
        let issued = service.issue_at(user_id, issued_at).await.unwrap();

        assert!(matches!(
            service.resolve(&issued.token).await,
            Err(AuthError::Expired)
        ));
        assert!(matches!(
            service
                .resolve_at(&issued.token, issued.record.expires_at)
                .await,
            Err(AuthError::Expired)
        ));
        assert_eq!(
            service
                .resolve_at(&issued.token, issued_at + Duration::days(59))
                .await
                .unwrap(),
            user_id
        );
    }

    #[tokio::test]
    async fn test_revoked_token_never_resolves() {
        let (service, _, user_id) = setup().await;
        let issued = service.issue(user_id).await.unwrap();

        service.revoke(&issued.token).await.unwrap();
        assert!(matches!(
            service.resolve(&issued.token).await,
            Err(AuthError::Revoked)
        ));

        // A second revoke is reported, but changes nothing
        assert!(matches!(
            service.revoke(&issued.token).await,
            Err(AuthError::AlreadyRevoked)
        ));
        assert!(matches!(
            service.resolve(&issued.token).await,
            Err(AuthError::Revoked)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_revokes_apply_once() {
        let (service, _, user_id) = setup().await;
        let issued = service.issue(user_id).await.unwrap();

        let (a, b) = tokio::join!(service.revoke(&issued.token), service.revoke(&issued.token));
        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
    }

    /// Store whose first `collisions` inserts report a duplicate
    struct CollidingStore {
        inner: Database,
        collisions: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RefreshTokenStore for CollidingStore {
        async fn insert(&self, token: NewRefreshToken) -> Result<RefreshToken, DbError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.collisions {
                return Err(DbError::Duplicate("refresh token already exists".to_string()));
            }
            self.inner.insert(token).await
        }

        async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DbError> {
            self.inner.find_by_token(token).await
        }

        async fn mark_revoked(&self, token: &str, now: DateTime<Utc>) -> Result<bool, DbError> {
            self.inner.mark_revoked(token, now).await
        }
    }

    #[tokio::test]
    async fn test_collision_retried_once() {
        let (_, db, user_id) = setup().await;

        let store = Arc::new(CollidingStore {
            inner: db.clone(),
            collisions: 1,
            calls: AtomicUsize::new(0),
        });
        let service = RefreshTokenService::new(store.clone(), Duration::days(60));
        assert!(service.issue(user_id).await.is_ok());
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);

        let store = Arc::new(CollidingStore {
            inner: db,
            collisions: 2,
            calls: AtomicUsize::new(0),
        });
        let service = RefreshTokenService::new(store.clone(), Duration::days(60));
        assert!(matches!(
            service.issue(user_id).await,
            Err(AuthError::StorageConflict)
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }
}
