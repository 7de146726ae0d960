use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{MeResponse, PublicUser, UpdateMeRequest},
    repo_types::UserDraft,
    services::{is_valid_username, load_with_articles, require_live_user, save},
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(update_me).delete(delete_me))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MeResponse>> {
    let user = load_with_articles(state.users.as_ref(), state.articles.as_ref(), user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::unauthorized("User not found"),
            other => other,
        })?;

    Ok(Json(MeResponse {
        id: user.meta.id,
        username: user.username,
        articles: user.articles,
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateMeRequest>,
) -> AppResult<Json<PublicUser>> {
    let current = require_live_user(state.users.as_ref(), user_id).await?;

    let username = match payload.username {
        Some(name) => {
            let name = name.trim().to_string();
            if !is_valid_username(&name) {
                warn!(username = %name, "invalid username");
                return Err(AppError::validation("Invalid username"));
            }
            name
        }
        None => current.username,
    };

    let password = payload.password.unwrap_or_default();
    if !password.is_empty() && password.len() < 8 {
        warn!("password too short");
        return Err(AppError::validation("Password too short"));
    }

    let user = save(
        state.users.as_ref(),
        state.hasher.as_ref(),
        UserDraft {
            id: Some(user_id),
            username,
            password,
        },
    )
    .await?;

    info!(user_id, "user updated");
    Ok(Json(PublicUser {
        id: user.meta.id,
        username: user.username,
    }))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<StatusCode> {
    state.users.soft_delete_user(user_id).await?;
    info!(user_id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::app::build_app;

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn register(app: &Router, username: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            request(
                "POST",
                "/api/v1/auth/register",
                None,
                Some(json!({"username": username, "password": password})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["accessToken"].as_str().unwrap().to_string()
    }

    async fn login(app: &Router, username: &str, password: &str) -> StatusCode {
        let (status, _) = send(
            app,
            request(
                "POST",
                "/api/v1/auth/login",
                None,
                Some(json!({"username": username, "password": password})),
            ),
        )
        .await;
        status
    }

    #[tokio::test]
    async fn rename_without_password_keeps_credentials() {
        let app = build_app(AppState::fake());
        let token = register(&app, "alice", "s3cret-pass").await;

        let (status, body) = send(
            &app,
            request("PUT", "/api/v1/me", Some(&token), Some(json!({"username": "alicia"}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "alicia");
        assert!(body.get("password").is_none());

        assert_eq!(login(&app, "alicia", "s3cret-pass").await, StatusCode::OK);
        assert_eq!(login(&app, "alice", "s3cret-pass").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn password_change_replaces_credentials() {
        let app = build_app(AppState::fake());
        let token = register(&app, "alice", "s3cret-pass").await;

        let (status, _) = send(
            &app,
            request("PUT", "/api/v1/me", Some(&token), Some(json!({"password": "n3w-secret"}))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(login(&app, "alice", "n3w-secret").await, StatusCode::OK);
        assert_eq!(login(&app, "alice", "s3cret-pass").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn short_new_password_is_bad_request() {
        let app = build_app(AppState::fake());
        let token = register(&app, "alice", "s3cret-pass").await;

        let (status, _) = send(
            &app,
            request("PUT", "/api/v1/me", Some(&token), Some(json!({"password": "short"}))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(login(&app, "alice", "s3cret-pass").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn rename_to_taken_username_conflicts() {
        let app = build_app(AppState::fake());
        register(&app, "bob", "s3cret-pass").await;
        let token = register(&app, "alice", "s3cret-pass").await;

        let (status, _) = send(
            &app,
            request("PUT", "/api/v1/me", Some(&token), Some(json!({"username": "bob"}))),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, me) = send(&app, request("GET", "/api/v1/me", Some(&token), None)).await;
        assert_eq!(me["username"], "alice");
    }

    #[tokio::test]
    async fn deleted_account_is_locked_out() {
        let app = build_app(AppState::fake());
        let token = register(&app, "alice", "s3cret-pass").await;

        let (status, _) = send(&app, request("DELETE", "/api/v1/me", Some(&token), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, request("GET", "/api/v1/me", Some(&token), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            request("PUT", "/api/v1/me", Some(&token), Some(json!({"username": "ghost"}))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        assert_eq!(login(&app, "alice", "s3cret-pass").await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn username_is_free_again_after_delete() {
        let app = build_app(AppState::fake());
        let token = register(&app, "alice", "s3cret-pass").await;
        send(&app, request("DELETE", "/api/v1/me", Some(&token), None)).await;

        register(&app, "alice", "an0ther-pass").await;
        assert_eq!(login(&app, "alice", "an0ther-pass").await, StatusCode::OK);
    }
}
