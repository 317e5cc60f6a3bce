//! Refresh token operations
//!
//! Each operation is a single statement, so concurrent callers never see
//! a half-applied change: inserts are guarded by the primary key and
//! revocation by `revoked_at IS NULL`.

use chrono::{DateTime, Utc};

use crate::error::DbError;
use crate::models::{NewRefreshToken, RefreshToken};
use crate::repository::Database;
use crate::utils::format_datetime;

impl Database {
    // ==================== Refresh Token Operations ====================

    /// Insert a refresh token; a duplicate token value yields `Duplicate`
    pub async fn insert_refresh_token(
        &self,
        token: NewRefreshToken,
    ) -> Result<RefreshToken, DbError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&token.token)
        .bind(token.user_id.to_string())
        .bind(format_datetime(&token.created_at))
        .bind(format_datetime(&token.created_at))
        .bind(format_datetime(&token.expires_at))
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "refresh token already exists"))?;

        Ok(RefreshToken {
            token: token.token,
            user_id: token.user_id,
            created_at: token.created_at,
            updated_at: token.created_at,
            expires_at: token.expires_at,
            revoked_at: None,
        })
    }

    /// Look up a refresh token by its value
    pub async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| RefreshToken::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Set `revoked_at` on a live token
    ///
    /// Returns `false` when the token is unknown or was already revoked.
    pub async fn revoke_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = ?, updated_at = ?
            WHERE token = ? AND revoked_at IS NULL
            "#,
        )
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .bind(token)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
