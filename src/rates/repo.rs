use async_trait::async_trait;

use super::repo_types::{ExchangeRate, NewExchangeRate};
use crate::{db::PgStore, error::AppResult};

/// Append-only store of rate snapshots, looked up through the currency-pair index.
#[async_trait]
pub trait RateRepo: Send + Sync {
    async fn insert_rate(&self, rate: &NewExchangeRate) -> AppResult<ExchangeRate>;

    /// History of one pair, newest first.
    async fn list_rates_by_pair(
        &self,
        from: &str,
        to: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ExchangeRate>>;

    async fn list_rates(&self, limit: i64, offset: i64) -> AppResult<Vec<ExchangeRate>>;

    /// Most recent snapshot of a pair. Ties on `date` go to the later insert.
    async fn latest_rate(&self, from: &str, to: &str) -> AppResult<Option<ExchangeRate>>;
}

#[async_trait]
impl RateRepo for PgStore {
    async fn insert_rate(&self, rate: &NewExchangeRate) -> AppResult<ExchangeRate> {
        let row = sqlx::query_as::<_, ExchangeRate>(
            r#"
            INSERT INTO exchange_rates (from_currency, to_currency, rate, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, from_currency, to_currency, rate, date
            "#,
        )
        .bind(&rate.from_currency)
        .bind(&rate.to_currency)
        .bind(rate.rate)
        .bind(rate.date)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    async fn list_rates_by_pair(
        &self,
        from: &str,
        to: &str,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<ExchangeRate>> {
        let rows = sqlx::query_as::<_, ExchangeRate>(
            r#"
            SELECT id, from_currency, to_currency, rate, date
              FROM exchange_rates
             WHERE from_currency = $1 AND to_currency = $2
             ORDER BY date DESC, id DESC
             LIMIT $3 OFFSET $4
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn list_rates(&self, limit: i64, offset: i64) -> AppResult<Vec<ExchangeRate>> {
        let rows = sqlx::query_as::<_, ExchangeRate>(
            r#"
            SELECT id, from_currency, to_currency, rate, date
              FROM exchange_rates
             ORDER BY date DESC, id DESC
             LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn latest_rate(&self, from: &str, to: &str) -> AppResult<Option<ExchangeRate>> {
        let row = sqlx::query_as::<_, ExchangeRate>(
            r#"
            SELECT id, from_currency, to_currency, rate, date
              FROM exchange_rates
             WHERE from_currency = $1 AND to_currency = $2
             ORDER BY date DESC, id DESC
             LIMIT 1
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }
}
