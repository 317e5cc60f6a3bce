//! JWT access token management
//!
//! Access tokens are HS256-signed JWTs carrying `{iss, sub, iat, exp}`.
//! They cannot be revoked, which is why their lifetime is short; the
//! refresh token carries revocability instead.

use chirpy_db::UserId;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AuthError;

/// Issuer claim stamped on every access token
pub const ISSUER: &str = "chirpy";

/// Default access token lifetime
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Subject (user ID)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// JWT manager for token generation and validation
///
/// Holds only immutable key material, so one instance can be shared by any
/// number of concurrent requests.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    leeway: Duration,
}

impl JwtManager {
    /// Create a new JWT manager
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
            leeway: Duration::zero(),
        }
    }

    /// Accept tokens up to `leeway` past their expiry (clock skew allowance)
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Lifetime of issued tokens
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue an access token for a user
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue an access token as if the current time were `now`
    pub fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(AuthError::LifetimeOverflow)?;
        let claims = Claims {
            iss: ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        debug!("Issuing access token for user: {}", user_id);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify an access token and return the user it was issued to
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify an access token as if the current time were `now`
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        let segments = token.split('.').collect::<Vec<_>>();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(AuthError::Malformed);
        }

        // First pass checks only the header and signature. Claims are
        // inspected below, against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_aud = false;

        let token_data = decode::<Map<String, Value>>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidToken => AuthError::Malformed,
                _ => AuthError::SignatureInvalid,
            })?;

        let claims: Claims = serde_json::from_value(Value::Object(token_data.claims))
            .map_err(|e| AuthError::ClaimsInvalid(e.to_string()))?;

        if claims.iss != ISSUER {
            return Err(AuthError::ClaimsInvalid(format!(
                "unexpected issuer: {}",
                claims.iss
            )));
        }

        if now.timestamp() >= claims.exp.saturating_add(self.leeway.num_seconds()) {
            return Err(AuthError::Expired);
        }

        claims
            .sub
            .parse::<UserId>()
            .map_err(|e| AuthError::SubjectInvalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key";

    fn manager() -> JwtManager {
        JwtManager::new(SECRET, Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS))
    }

    fn sign_raw<T: Serialize>(claims: &T) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_token_generation_and_validation() {
        let manager = manager();
        let user_id = UserId::new();

        let token = manager.issue(user_id).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(manager.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn test_oversized_ttl_is_an_error() {
        let manager = JwtManager::new(SECRET, Duration::seconds(9_000_000_000_000));

        assert!(matches!(
            manager.issue(UserId::new()),
            Err(AuthError::LifetimeOverflow)
        ));
    }

    #[test]
    fn test_expiry_boundary() {
        let manager = manager();
        let user_id = UserId::new();
        let issued_at = Utc::now() - Duration::hours(5);
        let token = manager.issue_at(user_id, issued_at).unwrap();
        let ttl = manager.ttl();

        let just_before = issued_at + ttl - Duration::seconds(1);
        assert_eq!(manager.verify_at(&token, just_before).unwrap(), user_id);

        assert!(matches!(
            manager.verify_at(&token, issued_at + ttl),
            Err(AuthError::Expired)
        ));
        assert!(matches!(
            manager.verify_at(&token, issued_at + ttl + Duration::seconds(1)),
            Err(AuthError::Expired)
        ));
        assert!(matches!(manager.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_lifetime_is_exactly_ttl() {
        let manager = manager();
        let token = manager.issue(UserId::new()).unwrap();

        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret(SECRET.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();
        assert_eq!(data.claims.exp - data.claims.iat, 3600);
        assert_eq!(data.claims.iss, "chirpy");
    }

    #[test]
    fn test_leeway_extends_acceptance() {
        let manager = manager().with_leeway(Duration::seconds(30));
        let user_id = UserId::new();
        let issued_at = Utc::now();
        let token = manager.issue_at(user_id, issued_at).unwrap();

        let late = issued_at + manager.ttl() + Duration::seconds(10);
        assert_eq!(manager.verify_at(&token, late).unwrap(), user_id);

        let too_late = issued_at + manager.ttl() + Duration::seconds(31);
        assert!(matches!(
            manager.verify_at(&token, too_late),
            Err(AuthError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret() {
        let token = manager().issue(UserId::new()).unwrap();
        let other = JwtManager::new("another-secret", Duration::hours(1));

        assert!(matches!(
            other.verify(&token),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_tampering_any_byte_invalidates() {
        let manager = manager();
        let token = manager.issue(UserId::new()).unwrap();

        for (i, byte) in token.bytes().enumerate() {
            if byte == b'.' {
                continue;
            }
            let mut tampered = token.clone().into_bytes();
            tampered[i] = if byte == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(tampered).unwrap();

            assert!(
                matches!(manager.verify(&tampered), Err(AuthError::SignatureInvalid)),
                "tampering byte {} was not detected",
                i
            );
        }
    }

    #[test]
    fn test_malformed_tokens() {
        let manager = manager();
        for token in ["testrejecttoken", "a.b", "a.b.c.d", "..", "a..c", ""] {
            assert!(
                matches!(manager.verify(token), Err(AuthError::Malformed)),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_missing_claims() {
        #[derive(Serialize)]
        struct Partial {
            iss: String,
            sub: String,
        }

        let token = sign_raw(&Partial {
            iss: ISSUER.to_string(),
            sub: UserId::new().to_string(),
        });
        assert!(matches!(
            manager().verify(&token),
            Err(AuthError::ClaimsInvalid(_))
        ));
    }

    #[test]
    fn test_wrong_issuer() {
        let now = Utc::now().timestamp();
        let token = sign_raw(&Claims {
            iss: "someone-else".to_string(),
            sub: UserId::new().to_string(),
            iat: now,
            exp: now + 60,
        });
        assert!(matches!(
            manager().verify(&token),
            Err(AuthError::ClaimsInvalid(_))
        ));
    }

    #[test]
    fn test_invalid_subject() {
        let now = Utc::now().timestamp();
        let token = sign_raw(&Claims {
            iss: ISSUER.to_string(),
            sub: "42".to_string(),
            iat: now,
            exp: now + 60,
        });
        assert!(matches!(
            manager().verify(&token),
            Err(AuthError::SubjectInvalid(_))
        ));
    }
}
