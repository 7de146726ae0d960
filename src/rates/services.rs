use time::OffsetDateTime;
use tracing::info;

use super::{
    repo::RateRepo,
    repo_types::{ExchangeRate, NewExchangeRate, RateDraft},
};
use crate::error::{AppError, AppResult};

fn required_currency(field: &str, value: Option<String>) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::validation(format!("{field} is required"))),
    }
}

/// Check a draft and append it. `date` defaults to now.
pub async fn record(repo: &dyn RateRepo, draft: RateDraft) -> AppResult<ExchangeRate> {
    let from_currency = required_currency("fromCurrency", draft.from_currency)?;
    let to_currency = required_currency("toCurrency", draft.to_currency)?;
    let rate = draft
        .rate
        .ok_or_else(|| AppError::validation("rate is required"))?;
    if !rate.is_finite() || rate <= 0.0 {
        return Err(AppError::validation("rate must be a positive number"));
    }

    let stored = repo
        .insert_rate(&NewExchangeRate {
            from_currency,
            to_currency,
            rate,
            date: draft.date.unwrap_or_else(OffsetDateTime::now_utc),
        })
        .await?;
    info!(
        rate_id = stored.id,
        from = %stored.from_currency,
        to = %stored.to_currency,
        rate = stored.rate,
        "exchange rate recorded"
    );
    Ok(stored)
}
