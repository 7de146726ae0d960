use tracing::info;

use super::{
    repo::ArticleRepo,
    repo_types::{Article, ArticlePatch, NewArticle},
};
use crate::{
    error::{AppError, AppResult},
    users::repo::UserRepo,
};

fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Validate and store a new article.
pub async fn create(repo: &dyn ArticleRepo, article: NewArticle) -> AppResult<Article> {
    require_non_empty("title", &article.title)?;
    require_non_empty("content", &article.content)?;
    require_non_empty("preview", &article.preview)?;
    if article.user_id <= 0 {
        return Err(AppError::ReferentialIntegrityFailure(format!(
            "user {} does not exist",
            article.user_id
        )));
    }

    let created = repo.insert_article(&article).await?;
    info!(article_id = created.meta.id, user_id = created.user_id, "article created");
    Ok(created)
}

/// Edit an article owned by `user_id`. Provided fields must be non-empty.
pub async fn edit(
    repo: &dyn ArticleRepo,
    id: i64,
    user_id: i64,
    patch: ArticlePatch,
) -> AppResult<Article> {
    if let Some(title) = &patch.title {
        require_non_empty("title", title)?;
    }
    if let Some(content) = &patch.content {
        require_non_empty("content", content)?;
    }
    if let Some(preview) = &patch.preview {
        require_non_empty("preview", preview)?;
    }

    let updated = repo.update_article(id, user_id, &patch).await?;
    info!(article_id = id, user_id, "article updated");
    Ok(updated)
}

/// Fetch an article with its `user` back-reference filled in.
pub async fn with_author(
    articles: &dyn ArticleRepo,
    users: &dyn UserRepo,
    id: i64,
) -> AppResult<Article> {
    let mut article = articles
        .find_article(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("article {id}")))?;
    article.user = users.find_user_by_id(article.user_id).await?.map(Box::new);
    Ok(article)
}
