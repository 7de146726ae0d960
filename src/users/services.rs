use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info};

use super::{
    repo::UserRepo,
    repo_types::{PreparedUser, User, UserDraft},
};
use crate::{
    articles::repo::ArticleRepo,
    auth::password::CredentialHasher,
    error::{AppError, AppResult},
};

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

/// Hash the draft's password if one was given.
///
/// A non-empty password costs exactly one hash computation. An empty one is
/// left alone so an update that does not touch the password can not clobber
/// the stored hash. Hashing errors abort before anything reaches the store.
pub fn prepare_for_persistence(
    draft: UserDraft,
    hasher: &dyn CredentialHasher,
) -> AppResult<PreparedUser> {
    let UserDraft {
        id,
        username,
        password,
    } = draft;

    let password_hash = if password.is_empty() {
        None
    } else {
        let hash = hasher.hash(&password).map_err(|e| {
            error!(error = %e, "password hashing failed");
            AppError::HashingFailure(e.to_string())
        })?;
        Some(hash)
    };

    Ok(PreparedUser {
        id,
        username,
        password_hash,
    })
}

/// Insert (no id) or update (with id) a user, hashing the password first.
pub async fn save(
    repo: &dyn UserRepo,
    hasher: &dyn CredentialHasher,
    draft: UserDraft,
) -> AppResult<User> {
    let prepared = prepare_for_persistence(draft, hasher)?;
    let user = match prepared.id() {
        None => repo.insert_user(&prepared).await?,
        Some(id) => repo.update_user(id, &prepared).await?,
    };
    info!(
        user_id = user.meta.id,
        username = %user.username,
        password_changed = prepared.password_hash().is_some(),
        "user saved"
    );
    Ok(user)
}

/// Look up a live user by name and check the password against its hash.
pub async fn authenticate(
    repo: &dyn UserRepo,
    hasher: &dyn CredentialHasher,
    username: &str,
    password: &str,
) -> AppResult<User> {
    let Some(user) = repo.find_user_by_username(username).await? else {
        debug!(username, "login unknown username");
        return Err(AppError::unauthorized("Invalid credentials"));
    };

    let ok = hasher
        .verify(password, &user.password)
        .map_err(|e| AppError::HashingFailure(e.to_string()))?;
    if !ok {
        debug!(user_id = user.meta.id, "login invalid password");
        return Err(AppError::unauthorized("Invalid credentials"));
    }
    Ok(user)
}

/// The account behind a session token, if it has not been deleted since the
/// token was issued.
pub async fn require_live_user(repo: &dyn UserRepo, id: i64) -> AppResult<User> {
    repo.find_user_by_id(id).await?.ok_or_else(|| {
        debug!(user_id = id, "token for deleted or unknown user");
        AppError::unauthorized("User not found")
    })
}

/// Load a live user together with the articles it owns.
pub async fn load_with_articles(
    users: &dyn UserRepo,
    articles: &dyn ArticleRepo,
    id: i64,
) -> AppResult<User> {
    let mut user = users
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {id}")))?;
    user.articles = articles.list_articles_by_user(id).await?;
    Ok(user)
}
