use serde::Deserialize;
use time::OffsetDateTime;

use crate::error::{AppError, AppResult};

/// Incoming rate. Presence of each field is checked by `services::record`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRateRequest {
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
    pub rate: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct PairQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl PairQuery {
    pub const MAX_LIMIT: i64 = 100;

    pub fn bounds(&self) -> (i64, i64) {
        (self.limit.clamp(1, Self::MAX_LIMIT), self.offset.max(0))
    }

    /// Trimmed currency pair, `None` when neither side is given. One side
    /// without the other, or a blank side, is a validation error.
    pub fn pair(&self) -> AppResult<Option<(&str, &str)>> {
        match (self.from.as_deref(), self.to.as_deref()) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) => {
                let (from, to) = (from.trim(), to.trim());
                if from.is_empty() || to.is_empty() {
                    return Err(AppError::validation("from and to must not be blank"));
                }
                Ok(Some((from, to)))
            }
            _ => Err(AppError::validation("from and to must be given together")),
        }
    }
}
