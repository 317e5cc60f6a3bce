//! Chirp operations

use chrono::Utc;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{Chirp, ChirpId, NewChirp, SortOrder, UserId};
use crate::repository::Database;
use crate::utils::format_datetime;

const CHIRP_COLUMNS: &str = "id, body, user_id, created_at, updated_at";

impl Database {
    // ==================== Chirp Operations ====================

    /// Insert a new chirp
    pub async fn insert_chirp(&self, chirp: NewChirp) -> Result<Chirp, DbError> {
        let now = Utc::now();
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO chirps (id, body, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&chirp.body)
        .bind(chirp.user_id.to_string())
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool)
        .await?;

        Ok(Chirp {
            id,
            body: chirp.body,
            user_id: chirp.user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a chirp by ID
    pub async fn get_chirp(&self, id: ChirpId) -> Result<Option<Chirp>, DbError> {
        let result = sqlx::query(&format!("SELECT {CHIRP_COLUMNS} FROM chirps WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        result.map(|row| Chirp::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List chirps by creation time, optionally restricted to one author
    pub async fn list_chirps(
        &self,
        author: Option<UserId>,
        order: SortOrder,
    ) -> Result<Vec<Chirp>, DbError> {
        let rows = match author {
            Some(author) => {
                sqlx::query(&format!(
                    "SELECT {CHIRP_COLUMNS} FROM chirps WHERE user_id = ? ORDER BY created_at {}, id",
                    order.as_sql()
                ))
                .bind(author.to_string())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {CHIRP_COLUMNS} FROM chirps ORDER BY created_at {}, id",
                    order.as_sql()
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.iter()
            .map(|row| Chirp::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Replace a chirp's body
    pub async fn update_chirp(&self, id: ChirpId, body: &str) -> Result<Option<Chirp>, DbError> {
        let now = Utc::now();
        let result = sqlx::query(&format!(
            r#"
            UPDATE chirps
            SET body = ?, updated_at = ?
            WHERE id = ?
            RETURNING {CHIRP_COLUMNS}
            "#
        ))
        .bind(body)
        .bind(format_datetime(&now))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| Chirp::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Delete a chirp
    pub async fn delete_chirp(&self, id: ChirpId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM chirps WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;

    async fn setup() -> (Database, UserId, UserId) {
        let db = Database::in_memory().await.unwrap();
        let mut ids = Vec::new();
        for email in ["a@b.com", "c@d.com"] {
            let user = db
                .insert_user(NewUser {
                    email: email.to_string(),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        (db, ids[0], ids[1])
    }

    fn chirp(body: &str, user_id: UserId) -> NewChirp {
        NewChirp {
            body: body.to_string(),
            user_id,
        }
    }

    #[tokio::test]
    async fn test_insert_get_update_delete() {
        let (db, alice, _) = setup().await;
        let created = db.insert_chirp(chirp("hello", alice)).await.unwrap();

        let fetched = db.get_chirp(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.body, "hello");
        assert_eq!(fetched.user_id, alice);

        let updated = db.update_chirp(created.id, "edited").await.unwrap().unwrap();
        assert_eq!(updated.body, "edited");

        assert!(db.delete_chirp(created.id).await.unwrap());
        assert!(db.get_chirp(created.id).await.unwrap().is_none());
        assert!(db.update_chirp(created.id, "gone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let (db, alice, bob) = setup().await;
        db.insert_chirp(chirp("first", alice)).await.unwrap();
        db.insert_chirp(chirp("second", bob)).await.unwrap();
        db.insert_chirp(chirp("third", alice)).await.unwrap();

        let all = db.list_chirps(None, SortOrder::Asc).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].body, "first");

        let desc = db.list_chirps(None, SortOrder::Desc).await.unwrap();
        assert_eq!(desc[0].body, "third");

        let alices = db.list_chirps(Some(alice), SortOrder::Asc).await.unwrap();
        assert_eq!(alices.len(), 2);
        assert!(alices.iter().all(|c| c.user_id == alice));
    }

    #[tokio::test]
    async fn test_chirps_cascade_with_user() {
        let (db, alice, _) = setup().await;
        let created = db.insert_chirp(chirp("hello", alice)).await.unwrap();

        db.delete_user(alice).await.unwrap();
        assert!(db.get_chirp(created.id).await.unwrap().is_none());
    }
}
