use serde::Serialize;
use sqlx::FromRow;

use crate::{record::RecordMeta, users::repo_types::User};

/// Article record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub title: String,
    pub content: String,
    pub preview: String,
    pub user_id: i64,
    // Back-reference for traversal only; never sent to clients.
    #[sqlx(skip)]
    #[serde(skip)]
    pub user: Option<Box<User>>,
}

/// Fields required to create an article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub preview: String,
    pub user_id: i64,
}

/// Partial edit of an article; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub preview: Option<String>,
}
