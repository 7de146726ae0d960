use serde::Serialize;
use sqlx::FromRow;

use crate::{articles::repo_types::Article, record::RecordMeta};

/// User record in the database.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String, // Argon2 hash, not exposed in JSON
    #[sqlx(skip)]
    pub articles: Vec<Article>, // owned articles, loaded on demand
}

/// A user as the caller wants it stored. `password` is plaintext or empty.
#[derive(Debug, Clone, Default)]
pub struct UserDraft {
    pub id: Option<i64>,
    pub username: String,
    pub password: String,
}

/// A user that went through the hashing step and may be written.
///
/// Only produced by `services::prepare_for_persistence`; there is no way to
/// turn it back into a draft, so a value can not be hashed twice.
#[derive(Debug)]
pub struct PreparedUser {
    pub(crate) id: Option<i64>,
    pub(crate) username: String,
    pub(crate) password_hash: Option<String>,
}

impl PreparedUser {
    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// `None` means the stored password must be left as it is.
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }
}
