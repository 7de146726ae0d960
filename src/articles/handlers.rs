use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{ArticleDetails, CreateArticleRequest, Pagination, UpdateArticleRequest},
    repo_types::{Article, ArticlePatch, NewArticle},
    services::{create, edit, with_author},
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
    users::services::require_live_user,
};

pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/articles", get(list_articles).post(create_article))
        .route(
            "/articles/:id",
            get(get_article).put(update_article).delete(delete_article),
        )
}

#[instrument(skip(state))]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> AppResult<Json<Vec<Article>>> {
    let (limit, offset) = p.bounds();
    let articles = state.articles.list_articles(limit, offset).await?;
    Ok(Json(articles))
}

#[instrument(skip(state))]
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ArticleDetails>> {
    let article = with_author(state.articles.as_ref(), state.users.as_ref(), id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::not_found("Article not found"),
            other => other,
        })?;
    Ok(Json(article.into()))
}

#[instrument(skip(state, body))]
pub async fn create_article(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateArticleRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<Article>)> {
    require_live_user(state.users.as_ref(), user_id).await?;
    let article = create(
        state.articles.as_ref(),
        NewArticle {
            title: body.title,
            content: body.content,
            preview: body.preview,
            user_id,
        },
    )
    .await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/articles/{}", article.meta.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(article)))
}

#[instrument(skip(state, body))]
pub async fn update_article(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateArticleRequest>,
) -> AppResult<Json<Article>> {
    let patch = ArticlePatch {
        title: body.title,
        content: body.content,
        preview: body.preview,
    };
    let article = edit(state.articles.as_ref(), id, user_id, patch).await?;
    Ok(Json(article))
}

#[instrument(skip(state))]
pub async fn delete_article(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.articles.soft_delete_article(id, user_id).await?;
    tracing::info!(article_id = id, user_id, "article retracted");
    Ok(StatusCode::NO_CONTENT)
}
