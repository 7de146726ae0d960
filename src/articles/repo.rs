use async_trait::async_trait;

use super::repo_types::{Article, ArticlePatch, NewArticle};
use crate::{
    db::PgStore,
    error::{AppError, AppResult},
};

const ARTICLE_COLUMNS: &str =
    "id, created_at, updated_at, deleted_at, title, content, preview, user_id";

#[async_trait]
pub trait ArticleRepo: Send + Sync {
    /// Insert an article owned by a live user. An unknown or deleted owner is a
    /// `ReferentialIntegrityFailure` and nothing is written.
    async fn insert_article(&self, article: &NewArticle) -> AppResult<Article>;

    async fn find_article(&self, id: i64) -> AppResult<Option<Article>>;

    /// Live articles, newest first.
    async fn list_articles(&self, limit: i64, offset: i64) -> AppResult<Vec<Article>>;

    async fn list_articles_by_user(&self, user_id: i64) -> AppResult<Vec<Article>>;

    /// Apply an edit to a live article owned by `user_id`.
    async fn update_article(
        &self,
        id: i64,
        user_id: i64,
        patch: &ArticlePatch,
    ) -> AppResult<Article>;

    async fn soft_delete_article(&self, id: i64, user_id: i64) -> AppResult<()>;
}

#[async_trait]
impl ArticleRepo for PgStore {
    async fn insert_article(&self, article: &NewArticle) -> AppResult<Article> {
        // owner liveness is checked in the same statement as the insert
        let row = sqlx::query_as::<_, Article>(&format!(
            r#"
            INSERT INTO articles (title, content, preview, user_id)
            SELECT $1, $2, $3, u.id
              FROM users u
             WHERE u.id = $4 AND u.deleted_at IS NULL
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.preview)
        .bind(article.user_id)
        .fetch_optional(self.pool())
        .await?;
        row.ok_or_else(|| {
            AppError::ReferentialIntegrityFailure(format!("user {} does not exist", article.user_id))
        })
    }

    async fn find_article(&self, id: i64) -> AppResult<Option<Article>> {
        let row = sqlx::query_as::<_, Article>(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn list_articles(&self, limit: i64, offset: i64) -> AppResult<Vec<Article>> {
        let rows = sqlx::query_as::<_, Article>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
              FROM articles
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn list_articles_by_user(&self, user_id: i64) -> AppResult<Vec<Article>> {
        let rows = sqlx::query_as::<_, Article>(&format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
              FROM articles
             WHERE user_id = $1 AND deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn update_article(
        &self,
        id: i64,
        user_id: i64,
        patch: &ArticlePatch,
    ) -> AppResult<Article> {
        let row = sqlx::query_as::<_, Article>(&format!(
            r#"
            UPDATE articles
               SET title = COALESCE($3, title),
                   content = COALESCE($4, content),
                   preview = COALESCE($5, preview),
                   updated_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(patch.title.as_deref())
        .bind(patch.content.as_deref())
        .bind(patch.preview.as_deref())
        .fetch_optional(self.pool())
        .await?;
        row.ok_or_else(|| AppError::not_found(format!("article {id}")))
    }

    async fn soft_delete_article(&self, id: i64, user_id: i64) -> AppResult<()> {
        let done = sqlx::query(
            r#"
            UPDATE articles
               SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool())
        .await?;
        if done.rows_affected() == 0 {
            return Err(AppError::not_found(format!("article {id}")));
        }
        Ok(())
    }
}
