use async_trait::async_trait;

use super::repo_types::{PreparedUser, User};
use crate::{
    db::PgStore,
    error::{AppError, AppResult},
};

const USER_COLUMNS: &str = "id, created_at, updated_at, deleted_at, username, password";

/// Persistence for user records. Reads only ever see live (non-deleted) rows.
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a new user. The prepared value must carry a password hash.
    async fn insert_user(&self, user: &PreparedUser) -> AppResult<User>;

    /// Update an existing user; a prepared value without a hash keeps the stored one.
    async fn update_user(&self, id: i64, user: &PreparedUser) -> AppResult<User>;

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn soft_delete_user(&self, id: i64) -> AppResult<()>;
}

#[async_trait]
impl UserRepo for PgStore {
    async fn insert_user(&self, user: &PreparedUser) -> AppResult<User> {
        let hash = user
            .password_hash()
            .ok_or_else(|| AppError::validation("password is required"))?;
        let row = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, password)
            VALUES ($1, $2)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.username())
        .bind(hash)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    async fn update_user(&self, id: i64, user: &PreparedUser) -> AppResult<User> {
        let row = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET username = $2,
                   password = COALESCE($3, password),
                   updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user.username())
        .bind(user.password_hash())
        .fetch_optional(self.pool())
        .await?;
        row.ok_or_else(|| AppError::not_found(format!("user {id}")))
    }

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND deleted_at IS NULL"
        ))
        .bind(username)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn soft_delete_user(&self, id: i64) -> AppResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE users
               SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(self.pool())
        .await?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found(format!("user {id}")));
        }
        Ok(())
    }
}
