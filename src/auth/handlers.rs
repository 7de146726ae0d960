use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest},
    jwt::JwtKeys,
};
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users::{
        dto::PublicUser,
        repo_types::{User, UserDraft},
        services::{authenticate, is_valid_username, require_live_user, save},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

fn issue_tokens(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.meta.id).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        AppError::Internal(e)
    })?;
    let refresh_token = keys.sign_refresh(user.meta.id).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        AppError::Internal(e)
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.meta.id,
            username: user.username,
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    payload.username = payload.username.trim().to_string();

    if !is_valid_username(&payload.username) {
        warn!(username = %payload.username, "invalid username");
        return Err(AppError::validation("Invalid username"));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AppError::validation("Password too short"));
    }

    let user = save(
        state.users.as_ref(),
        state.hasher.as_ref(),
        UserDraft {
            id: None,
            username: payload.username,
            password: payload.password,
        },
    )
    .await
    .map_err(|e| {
        if let AppError::ConstraintViolation(_) = e {
            warn!("username already registered");
            return AppError::ConstraintViolation("Username already registered".into());
        }
        e
    })?;

    info!(user_id = user.meta.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.username = payload.username.trim().to_string();

    let user = authenticate(
        state.users.as_ref(),
        state.hasher.as_ref(),
        &payload.username,
        &payload.password,
    )
    .await
    .map_err(|e| {
        if let AppError::Unauthorized(_) = e {
            warn!(username = %payload.username, "login rejected");
        }
        e
    })?;

    info!(user_id = user.meta.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::unauthorized(e.to_string()))?;

    let user = require_live_user(state.users.as_ref(), claims.sub).await?;

    Ok(Json(issue_tokens(&state, user)?))
}
