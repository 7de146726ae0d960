//! In-process store with the same constraints as the Postgres schema:
//! live-username uniqueness, live-owner foreign key and soft deletes.

use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    articles::{
        repo::ArticleRepo,
        repo_types::{Article, ArticlePatch, NewArticle},
    },
    error::{AppError, AppResult},
    rates::{
        repo::RateRepo,
        repo_types::{ExchangeRate, NewExchangeRate},
    },
    record::RecordMeta,
    users::{
        repo::UserRepo,
        repo_types::{PreparedUser, User},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    articles: Vec<Article>,
    rates: Vec<ExchangeRate>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users.iter().any(|u| {
            is_live(&u.meta) && u.username == username && Some(u.meta.id) != except
        })
    }

    fn live_user_mut(&mut self, id: i64) -> Option<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.meta.id == id && is_live(&u.meta))
    }

    fn owned_article_mut(&mut self, id: i64, user_id: i64) -> Option<&mut Article> {
        self.articles
            .iter_mut()
            .find(|a| a.meta.id == id && a.user_id == user_id && is_live(&a.meta))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> AppResult<T>) -> AppResult<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|e| anyhow::anyhow!("memory store lock poisoned: {e}"))?;
        f(&mut tables)
    }
}

fn fresh_meta(id: i64) -> RecordMeta {
    let now = OffsetDateTime::now_utc();
    RecordMeta {
        id,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn is_live(meta: &RecordMeta) -> bool {
    meta.deleted_at.is_none()
}

fn newest_first(rates: &mut [ExchangeRate]) {
    rates.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
}

fn page<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn insert_user(&self, user: &PreparedUser) -> AppResult<User> {
        let hash = user
            .password_hash()
            .ok_or_else(|| AppError::validation("password is required"))?;
        self.with_tables(|t| {
            if t.username_taken(user.username(), None) {
                return Err(AppError::ConstraintViolation(format!(
                    "username {} already exists",
                    user.username()
                )));
            }
            let row = User {
                meta: fresh_meta(t.next_id()),
                username: user.username().to_string(),
                password: hash.to_string(),
                articles: Vec::new(),
            };
            t.users.push(row.clone());
            Ok(row)
        })
    }

    async fn update_user(&self, id: i64, user: &PreparedUser) -> AppResult<User> {
        self.with_tables(|t| {
            if t.username_taken(user.username(), Some(id)) {
                return Err(AppError::ConstraintViolation(format!(
                    "username {} already exists",
                    user.username()
                )));
            }
            let row = t
                .live_user_mut(id)
                .ok_or_else(|| AppError::not_found(format!("user {id}")))?;
            row.username = user.username().to_string();
            if let Some(hash) = user.password_hash() {
                row.password = hash.to_string();
            }
            row.meta.updated_at = OffsetDateTime::now_utc();
            Ok(row.clone())
        })
    }

    async fn find_user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        self.with_tables(|t| Ok(t.live_user_mut(id).map(|u| u.clone())))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.with_tables(|t| {
            Ok(t.users
                .iter()
                .find(|u| u.username == username && is_live(&u.meta))
                .cloned())
        })
    }

    async fn soft_delete_user(&self, id: i64) -> AppResult<()> {
        self.with_tables(|t| {
            let row = t
                .live_user_mut(id)
                .ok_or_else(|| AppError::not_found(format!("user {id}")))?;
            let now = OffsetDateTime::now_utc();
            row.meta.deleted_at = Some(now);
            row.meta.updated_at = now;
            Ok(())
        })
    }
}

#[async_trait]
impl ArticleRepo for MemoryStore {
    async fn insert_article(&self, article: &NewArticle) -> AppResult<Article> {
        self.with_tables(|t| {
            if t.live_user_mut(article.user_id).is_none() {
                return Err(AppError::ReferentialIntegrityFailure(format!(
                    "user {} does not exist",
                    article.user_id
                )));
            }
            let row = Article {
                meta: fresh_meta(t.next_id()),
                title: article.title.clone(),
                content: article.content.clone(),
                preview: article.preview.clone(),
                user_id: article.user_id,
                user: None,
            };
            t.articles.push(row.clone());
            Ok(row)
        })
    }

    async fn find_article(&self, id: i64) -> AppResult<Option<Article>> {
        self.with_tables(|t| {
            Ok(t.articles
                .iter()
                .find(|a| a.meta.id == id && is_live(&a.meta))
                .cloned())
        })
    }

    async fn list_articles(&self, limit: i64, offset: i64) -> AppResult<Vec<Article>> {
        self.with_tables(|t| {
            let live: Vec<Article> = t
                .articles
                .iter()
                .rev()
                .filter(|a| is_live(&a.meta))
                .cloned()
                .collect();
            Ok(page(live, limit, offset))
        })
    }

    async fn list_articles_by_user(&self, user_id: i64) -> AppResult<Vec<Article>> {
        self.with_tables(|t| {
            Ok(t.articles
                .iter()
                .rev()
                .filter(|a| a.user_id == user_id && is_live(&a.meta))
                .cloned()
                .collect())
        })
    }

    async fn update_article(
        &self,
        id: i64,
        user_id: i64,
        patch: &ArticlePatch,
    ) -> AppResult<Article> {
        self.with_tables(|t| {
            let row = t
                .owned_article_mut(id, user_id)
                .ok_or_else(|| AppError::not_found(format!("article {id}")))?;
            if let Some(title) = &patch.title {
                row.title = title.clone();
            }
            if let Some(content) = &patch.content {
                row.content = content.clone();
            }
            if let Some(preview) = &patch.preview {
                row.preview = preview.clone();
            }
            row.meta.updated_at = OffsetDateTime::now_utc();
            Ok(row.clone())
        })
    }

    async fn soft_delete_article(&self, id: i64, user_id: i64) -> AppResult<()> {
        self.with_tables(|t| {
            let row = t
                .owned_article_mut(id, user_id)
                .ok_or_else(|| AppError::not_found(format!("article {id}")))?;
            let now = OffsetDateTime::now_utc();
            row.meta.deleted_at = Some(now);
            row.meta.updated_at = now;
            Ok(())
        })
    }
}

#[async_trait]
impl RateRepo for MemoryStore {
    async fn insert_rate(&self, rate: &NewExchangeRate) -> AppResult<ExchangeRate> {
        self.with_tables(|t| {
            let row = ExchangeRate {
                id: t.next_id(),
                from_currency: rate.from_currency.clone(),
                to_currency: rate.to_currency.clone(),
                rate: rate.rate,
                date: rate.date,
            };
            t.rates.push(row.clone());
            Ok(row)
        })
    }

    async fn list_rates_by_pair(
        &self,
        from: &str,
        to: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ExchangeRate>> {
        self.with_tables(|t| {
            let mut rows: Vec<ExchangeRate> = t
                .rates
                .iter()
                .filter(|r| r.from_currency == from && r.to_currency == to)
                .cloned()
                .collect();
            newest_first(&mut rows);
            Ok(page(rows, limit, offset))
        })
    }

    async fn list_rates(&self, limit: i64, offset: i64) -> AppResult<Vec<ExchangeRate>> {
        self.with_tables(|t| {
            let mut rows = t.rates.clone();
            newest_first(&mut rows);
            Ok(page(rows, limit, offset))
        })
    }

    async fn latest_rate(&self, from: &str, to: &str) -> AppResult<Option<ExchangeRate>> {
        Ok(self
            .list_rates_by_pair(from, to, 1, 0)
            .await?
            .into_iter()
            .next())
    }
}
