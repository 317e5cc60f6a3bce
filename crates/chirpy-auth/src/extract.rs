//! Credential extraction from request headers

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::error::AuthError;

/// Scheme prefix for access and refresh tokens
pub const BEARER_PREFIX: &str = "Bearer ";

/// Scheme prefix for the webhook API key
pub const API_KEY_PREFIX: &str = "ApiKey ";

/// Read the `Authorization` header, treating an empty value as absent
fn authorization(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::InvalidScheme)?;

    if value.trim().is_empty() {
        return Err(AuthError::MissingCredential);
    }
    Ok(value)
}

/// Strip `prefix` from `value`, trimming the credential that follows
///
/// Returns `Ok(None)` when the scheme matches but no credential follows.
fn strip_scheme<'a>(value: &'a str, prefix: &str) -> Result<Option<&'a str>, AuthError> {
    match value.strip_prefix(prefix) {
        Some(rest) => {
            let rest = rest.trim();
            Ok((!rest.is_empty()).then_some(rest))
        }
        // A bare scheme name whose trailing space was trimmed in transit
        None if value.trim_end() == prefix.trim_end() => Ok(None),
        None => Err(AuthError::InvalidScheme),
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    strip_scheme(authorization(headers)?, BEARER_PREFIX)?.ok_or(AuthError::EmptyCredential)
}

/// Extract the key from `Authorization: ApiKey <key>`
pub fn api_key(headers: &HeaderMap) -> Result<&str, AuthError> {
    strip_scheme(authorization(headers)?, API_KEY_PREFIX)?.ok_or(AuthError::MissingCredential)
}
