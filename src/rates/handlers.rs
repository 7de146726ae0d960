use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{debug, instrument};

use super::{
    dto::{PairQuery, RecordRateRequest},
    repo_types::{ExchangeRate, RateDraft},
    services::record,
};
use crate::{
    auth::jwt::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
    users::services::require_live_user,
};

pub fn rate_routes() -> Router<AppState> {
    Router::new()
        .route("/exchangeRates", get(list_rates).post(record_rate))
        .route("/exchangeRates/latest", get(latest_rate))
}

#[instrument(skip(state, body))]
pub async fn record_rate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<RecordRateRequest>,
) -> AppResult<(StatusCode, Json<ExchangeRate>)> {
    require_live_user(state.users.as_ref(), user_id).await?;
    let rate = record(
        state.rates.as_ref(),
        RateDraft {
            from_currency: body.from_currency,
            to_currency: body.to_currency,
            rate: body.rate,
            date: body.date,
        },
    )
    .await?;
    debug!(user_id, rate_id = rate.id, "rate submitted");
    Ok((StatusCode::CREATED, Json(rate)))
}

#[instrument(skip(state))]
pub async fn list_rates(
    State(state): State<AppState>,
    Query(q): Query<PairQuery>,
) -> AppResult<Json<Vec<ExchangeRate>>> {
    let (limit, offset) = q.bounds();
    let rates = match q.pair()? {
        Some((from, to)) => state.rates.list_rates_by_pair(from, to, limit, offset).await?,
        None => state.rates.list_rates(limit, offset).await?,
    };
    Ok(Json(rates))
}

#[instrument(skip(state))]
pub async fn latest_rate(
    State(state): State<AppState>,
    Query(q): Query<PairQuery>,
) -> AppResult<Json<ExchangeRate>> {
    let (from, to) = q
        .pair()?
        .ok_or_else(|| AppError::validation("from and to are required"))?;
    let rate = state
        .rates
        .latest_rate(from, to)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no rate for {from}/{to}")))?;
    Ok(Json(rate))
}
