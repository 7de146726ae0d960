use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Snapshot of one currency pair's rate at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    #[serde(rename = "_id")]
    pub id: i64,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

/// A validated rate ready to be appended.
#[derive(Debug, Clone)]
pub struct NewExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub date: OffsetDateTime,
}

/// Rate as received; fields are checked by `services::record`.
#[derive(Debug, Clone, Default)]
pub struct RateDraft {
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
    pub rate: Option<f64>,
    pub date: Option<OffsetDateTime>,
}
